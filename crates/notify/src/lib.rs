//! Alert delivery over email and Slack.
//!
//! This crate provides:
//! - `ConnectionManager` establishing authenticated SMTP sessions with bounded retry
//! - `Dispatcher` sending composed emails, retrying on mid-send disconnects
//! - `compose_email` building HTML emails with attachments
//! - `format_anomalies` rendering direction-aware anomaly summaries
//! - Slack Block Kit layouts and a webhook client for every alert variant
//! - Minijinja rendering of HTML email bodies

pub mod blocks;
pub mod connection;
pub mod credentials;
pub mod data;
pub mod dispatcher;
pub mod email;
pub mod formatter;
pub mod links;
pub mod slack;
pub mod templating;
pub mod traits;

#[cfg(test)]
mod mock;

pub use connection::{ConnectionManager, LettreConnector, SmtpConnector, SmtpSession};
pub use credentials::{EnvCredentials, StaticCredentials};
pub use dispatcher::Dispatcher;
pub use email::{compose_email, compose_rerouted_email, Attachment, ComposedEmail, EmailAlerter};
pub use formatter::format_anomalies;
pub use links::WebappLinks;
pub use slack::{DeliveryStatus, SlackAlerter, WebhookClient};
pub use traits::{AlertError, CredentialProvider, LinkBuilder, SmtpError};
