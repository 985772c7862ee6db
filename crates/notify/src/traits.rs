//! Provider seams and shared error types.
//!
//! The delivery core treats credential lookup and dashboard URL
//! construction as external capabilities. Both are expressed as traits
//! here so callers can inject their own implementations.

use std::fmt;

use vigil_core::{ConfigError, EmailConfig, SlackConfig};

/// Errors that can occur during alert delivery.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("SMTP connection failed after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: SmtpError,
    },

    #[error("Email delivery failed: {0}")]
    Delivery(String),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Message construction failed: {0}")]
    Message(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Template rendering failed: {0}")]
    Template(String),
}

/// Step of the SMTP handshake that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    Connect,
    Ehlo,
    StartTls,
    Login,
}

impl fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeStage::Connect => "connect",
            HandshakeStage::Ehlo => "ehlo",
            HandshakeStage::StartTls => "starttls",
            HandshakeStage::Login => "login",
        };
        f.write_str(name)
    }
}

/// Transport-level SMTP failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SmtpError {
    #[error("{stage} failed: {message}")]
    Handshake {
        stage: HandshakeStage,
        message: String,
    },

    /// The server dropped the connection mid-transaction. The only
    /// send-time failure that is worth retrying.
    #[error("server disconnected: {0}")]
    Disconnected(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),
}

impl SmtpError {
    pub fn handshake(stage: HandshakeStage, message: impl fmt::Display) -> Self {
        SmtpError::Handshake {
            stage,
            message: message.to_string(),
        }
    }
}

/// Supplies channel settings. Called at the start of every top-level send,
/// so rotated credentials take effect on the next call.
pub trait CredentialProvider: Send + Sync {
    fn email_config(&self) -> Result<EmailConfig, AlertError>;

    fn slack_config(&self) -> Result<SlackConfig, AlertError>;
}

/// Builds dashboard links embedded in alerts.
pub trait LinkBuilder: Send + Sync {
    /// Anomaly page of a single KPI.
    fn kpi_link(&self, kpi_id: u64) -> String;

    fn alert_dashboard_link(&self) -> String;

    fn dashboard_link(&self) -> String;
}
