//! Delivers composed emails, retrying when the server drops the connection.
//!
//! Each attempt acquires a fresh session through the [`ConnectionManager`].
//! Only a mid-transaction disconnect triggers another attempt; any other
//! failure is returned to the caller immediately.

use lettre::address::Envelope;
use lettre::Address;
use vigil_core::EmailConfig;

use crate::connection::{ConnectionManager, SmtpConnector, SmtpSession};
use crate::email::ComposedEmail;
use crate::traits::{AlertError, SmtpError};

/// Total send attempts when the server keeps disconnecting.
pub const MAX_SEND_ATTEMPTS: u32 = 3;

/// Where every message goes when the channel runs in debug mode.
pub const DEBUG_SINK_ADDRESS: &str = "no-reply@example.com";

/// Sends composed emails through sessions from a [`ConnectionManager`].
pub struct Dispatcher<C> {
    /// Source of a fresh authenticated session per attempt.
    connections: ConnectionManager<C>,
}

impl<C: SmtpConnector> Dispatcher<C> {
    /// Dispatcher opening its sessions through `connector`.
    pub fn new(connector: C) -> Self {
        Self {
            connections: ConnectionManager::new(connector),
        }
    }

    /// Envelope recipients after applying the debug-mode override.
    pub fn resolve_recipients(config: &EmailConfig, recipients: &[String]) -> Vec<String> {
        if config.debug {
            tracing::debug!(
                requested = recipients.len(),
                sink = DEBUG_SINK_ADDRESS,
                "debug mode, rerouting email"
            );
            vec![DEBUG_SINK_ADDRESS.to_string()]
        } else {
            recipients.to_vec()
        }
    }

    /// Transmit `message` to `recipients`.
    ///
    /// The `To:` header keeps the caller's recipients; only the SMTP envelope
    /// is rerouted in debug mode.
    pub async fn send(
        &self,
        config: &EmailConfig,
        recipients: &[String],
        message: ComposedEmail,
    ) -> Result<(), AlertError> {
        let targets = Self::resolve_recipients(config, recipients);
        let envelope = build_envelope(message.sender(), &targets)?;
        let raw = message.formatted();

        for attempt in 1..=MAX_SEND_ATTEMPTS {
            let mut session = self.connections.acquire_session(config).await?;

            match session.send(&envelope, &raw).await {
                Ok(()) => {
                    if let Err(e) = session.quit().await {
                        tracing::debug!(error = %e, "SMTP quit failed after delivery");
                    }
                    tracing::info!(
                        channel = "email",
                        recipients = %targets.join(", "),
                        attempt,
                        "Email sent"
                    );
                    return Ok(());
                }
                Err(SmtpError::Disconnected(reason)) => {
                    tracing::info!(
                        attempt,
                        max_attempts = MAX_SEND_ATTEMPTS,
                        reason = %reason,
                        "Server disconnected during send, retrying"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Email delivery failed");
                    return Err(AlertError::Delivery(e.to_string()));
                }
            }
        }

        Err(AlertError::Delivery("max retries exhausted".to_string()))
    }
}

fn build_envelope(sender: &Address, targets: &[String]) -> Result<Envelope, AlertError> {
    let to = targets
        .iter()
        .map(|t| {
            t.trim()
                .parse::<Address>()
                .map_err(|e| AlertError::Address(format!("{t}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Envelope::new(Some(sender.clone()), to).map_err(|e| AlertError::Message(e.to_string()))
}
