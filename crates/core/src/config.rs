use std::collections::HashMap;
use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_WEBAPP_URL: &str = "http://localhost:8080/";

/// Key lookup used while building a [`Config`]. Returns `None` for unset or
/// empty values.
type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled key: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_opt(lookup: &Lookup<'_>, profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = lookup(&prefixed) {
            return Some(v);
        }
    }
    lookup(key)
}

fn profiled_or(lookup: &Lookup<'_>, profile: &str, key: &str, default: &str) -> String {
    profiled_opt(lookup, profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_u16(lookup: &Lookup<'_>, profile: &str, key: &str, default: u16) -> u16 {
    match profiled_opt(lookup, profile, key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default, "Unparsable port, using default");
            default
        }),
        None => default,
    }
}

fn profiled_bool(lookup: &Lookup<'_>, profile: &str, key: &str) -> bool {
    profiled_opt(lookup, profile, key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

// ── Channels ──────────────────────────────────────────────────

/// Delivery channels an alert can be routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Slack,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Email => f.write_str("email"),
            ChannelKind::Slack => f.write_str("slack"),
        }
    }
}

/// Fully resolved settings for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "lowercase")]
pub enum ChannelConfig {
    Email(EmailConfig),
    Slack(SlackConfig),
}

/// SMTP settings. Every field is required; see [`EmailConfig::validate`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub sender: String,
    /// Route every message to a fixed sink address instead of the real
    /// recipients.
    #[serde(default)]
    pub debug: bool,
}

impl EmailConfig {
    /// Check that no required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("SMTP_HOST", self.host.as_str()),
            ("SMTP_USER", self.user.as_str()),
            ("SMTP_PASSWORD", self.password.as_str()),
            ("SMTP_SENDER", self.sender.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    channel: ChannelKind::Email,
                    field,
                });
            }
        }
        if self.port == 0 {
            return Err(ConfigError::MissingField {
                channel: ChannelKind::Email,
                field: "SMTP_PORT",
            });
        }
        Ok(())
    }
}

// Passwords must never end up in logs.
impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .field("debug", &self.debug)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackConfig {
    pub webhook_url: String,
}

impl fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackConfig")
            .field("webhook_url", &"<redacted>")
            .finish()
    }
}

// ── Top-level config ──────────────────────────────────────────

/// Raw SMTP settings as read from the environment. Fields stay optional
/// until [`Config::email`] resolves them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailSettings {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub sender: Option<String>,
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub email: EmailSettings,
    #[serde(skip_serializing)]
    pub slack_webhook_url: Option<String>,
    pub webapp_url: String,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `VIGIL_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_opt("VIGIL_PROFILE").unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        Self::build(profile, &env_opt)
    }

    /// Build config from an explicit key/value map instead of the process
    /// environment.
    pub fn from_vars(profile: &str, vars: &HashMap<String, String>) -> Self {
        let lookup = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();
        Self::build(profile, &lookup)
    }

    fn build(profile: &str, lookup: &Lookup<'_>) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            email: EmailSettings {
                host: profiled_opt(lookup, p, "SMTP_HOST"),
                port: profiled_u16(lookup, p, "SMTP_PORT", DEFAULT_SMTP_PORT),
                user: profiled_opt(lookup, p, "SMTP_USER"),
                password: profiled_opt(lookup, p, "SMTP_PASSWORD"),
                sender: profiled_opt(lookup, p, "SMTP_SENDER"),
                debug: profiled_bool(lookup, p, "SMTP_DEBUG"),
            },
            slack_webhook_url: profiled_opt(lookup, p, "SLACK_WEBHOOK_URL"),
            webapp_url: profiled_or(lookup, p, "WEBAPP_URL", DEFAULT_WEBAPP_URL),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Resolve SMTP settings, failing on the first missing field.
    pub fn email(&self) -> Result<EmailConfig, ConfigError> {
        fn required(value: &Option<String>, field: &'static str) -> Result<String, ConfigError> {
            value.clone().ok_or(ConfigError::MissingField {
                channel: ChannelKind::Email,
                field,
            })
        }

        let e = &self.email;
        let config = EmailConfig {
            host: required(&e.host, "SMTP_HOST")?,
            port: e.port,
            user: required(&e.user, "SMTP_USER")?,
            password: required(&e.password, "SMTP_PASSWORD")?,
            sender: required(&e.sender, "SMTP_SENDER")?,
            debug: e.debug,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn slack(&self) -> Result<SlackConfig, ConfigError> {
        match self.slack_webhook_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(SlackConfig {
                webhook_url: url.to_string(),
            }),
            _ => Err(ConfigError::Unconfigured(ChannelKind::Slack)),
        }
    }

    pub fn channel(&self, kind: ChannelKind) -> Result<ChannelConfig, ConfigError> {
        match kind {
            ChannelKind::Email => self.email().map(ChannelConfig::Email),
            ChannelKind::Slack => self.slack().map(ChannelConfig::Slack),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  email:   host={}, port={}, sender={}, debug={}",
            self.email.host.as_deref().unwrap_or("(none)"),
            self.email.port,
            self.email.sender.as_deref().unwrap_or("(none)"),
            self.email.debug
        );
        tracing::info!(
            "  slack:   webhook={}",
            if self.slack_webhook_url.is_some() { "configured" } else { "(none)" }
        );
        tracing::info!("  webapp:  url={}", self.webapp_url);
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "email": {
                "host": self.email.host,
                "port": self.email.port,
                "sender": self.email.sender,
                "debug": self.email.debug,
                "configured": self.email().is_ok(),
            },
            "slack": { "configured": self.slack().is_ok() },
            "webapp_url": self.webapp_url,
        })
    }
}
