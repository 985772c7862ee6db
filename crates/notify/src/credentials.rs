//! Credential providers backed by the environment or by fixed values.

use vigil_core::{Config, ConfigError, EmailConfig, SlackConfig};

use crate::traits::{AlertError, CredentialProvider};

/// Re-reads the process environment on every call.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials {
    profile: Option<String>,
}

impl EnvCredentials {
    /// Use the profile named by `VIGIL_PROFILE`.
    pub fn new() -> Self {
        Self { profile: None }
    }

    /// Pin a profile regardless of `VIGIL_PROFILE`.
    pub fn with_profile(profile: impl Into<String>) -> Self {
        Self {
            profile: Some(profile.into()),
        }
    }

    fn load(&self) -> Config {
        match &self.profile {
            Some(p) => Config::for_profile(p),
            None => Config::from_env(),
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn email_config(&self) -> Result<EmailConfig, AlertError> {
        Ok(self.load().email()?)
    }

    fn slack_config(&self) -> Result<SlackConfig, AlertError> {
        Ok(self.load().slack()?)
    }
}

/// Fixed settings, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    /// `None` reports the email channel as unconfigured.
    pub email: Option<EmailConfig>,
    /// `None` reports the Slack channel as unconfigured.
    pub slack: Option<SlackConfig>,
}

impl StaticCredentials {
    /// Email settings only.
    pub fn email(config: EmailConfig) -> Self {
        Self {
            email: Some(config),
            slack: None,
        }
    }

    /// Slack settings only.
    pub fn slack(config: SlackConfig) -> Self {
        Self {
            email: None,
            slack: Some(config),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn email_config(&self) -> Result<EmailConfig, AlertError> {
        let config = self
            .email
            .clone()
            .ok_or(ConfigError::Unconfigured(vigil_core::ChannelKind::Email))?;
        config.validate()?;
        Ok(config)
    }

    fn slack_config(&self) -> Result<SlackConfig, AlertError> {
        match &self.slack {
            Some(c) if !c.webhook_url.trim().is_empty() => Ok(c.clone()),
            _ => Err(ConfigError::Unconfigured(vigil_core::ChannelKind::Slack).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_without_email_is_unconfigured() {
        let creds = StaticCredentials::default();
        let err = creds.email_config().unwrap_err();
        assert!(matches!(err, AlertError::Config(ConfigError::Unconfigured(_))));
    }

    #[test]
    fn static_email_is_validated() {
        let creds = StaticCredentials::email(EmailConfig {
            host: "smtp.example.com".into(),
            port: 587,
            user: "mailer".into(),
            password: String::new(),
            sender: "alerts@example.com".into(),
            debug: false,
        });
        let err = creds.email_config().unwrap_err();
        assert!(err.to_string().contains("SMTP_PASSWORD"), "got: {err}");
    }

    #[test]
    fn static_blank_webhook_is_unconfigured() {
        let creds = StaticCredentials::slack(SlackConfig {
            webhook_url: "  ".into(),
        });
        assert!(creds.slack_config().is_err());
    }

    #[test]
    fn env_changes_are_picked_up_per_call() {
        let creds = EnvCredentials::with_profile("VIGILROTATE");
        std::env::set_var("VIGILROTATE_SLACK_WEBHOOK_URL", "https://hooks.example.com/one");
        assert_eq!(
            creds.slack_config().unwrap().webhook_url,
            "https://hooks.example.com/one"
        );
        std::env::set_var("VIGILROTATE_SLACK_WEBHOOK_URL", "https://hooks.example.com/two");
        assert_eq!(
            creds.slack_config().unwrap().webhook_url,
            "https://hooks.example.com/two"
        );
        std::env::remove_var("VIGILROTATE_SLACK_WEBHOOK_URL");
    }
}
