//! Authenticated SMTP session establishment with bounded retry.
//!
//! A session is acquired by running the full handshake: open the plaintext
//! transport, EHLO, STARTTLS, EHLO again (the encrypted channel may advertise
//! different capabilities), then log in. Any failure aborts the attempt and
//! the next attempt starts over from a fresh connection.
//!
//! On the wire, lettre already greets with EHLO when the transport opens and
//! again right after the TLS upgrade, so [`LettreSession`] repeats each EHLO
//! once. Servers accept a repeated EHLO and answer with fresh capabilities.

use std::time::Duration;

use lettre::address::Envelope;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{AsyncSmtpConnection, TlsParameters};
use lettre::transport::smtp::commands::Ehlo;
use lettre::transport::smtp::extension::ClientId;
use vigil_core::EmailConfig;

use crate::traits::{AlertError, HandshakeStage, SmtpError};

/// Total handshake attempts before giving up.
pub const MAX_CONNECT_ATTEMPTS: u32 = 4;

/// One open SMTP connection.
#[async_trait::async_trait]
pub trait SmtpSession: Send {
    async fn ehlo(&mut self) -> Result<(), SmtpError>;

    async fn starttls(&mut self) -> Result<(), SmtpError>;

    async fn login(&mut self, user: &str, password: &str) -> Result<(), SmtpError>;

    /// Transmit one message. A dropped connection must be reported as
    /// [`SmtpError::Disconnected`].
    async fn send(&mut self, envelope: &Envelope, raw: &[u8]) -> Result<(), SmtpError>;

    async fn quit(&mut self) -> Result<(), SmtpError>;
}

/// Opens plaintext SMTP connections.
#[async_trait::async_trait]
pub trait SmtpConnector: Send + Sync {
    type Session: SmtpSession;

    async fn open(&self, host: &str, port: u16) -> Result<Self::Session, SmtpError>;
}

/// Real connector on top of lettre's low-level async connection.
#[derive(Debug, Clone, Default)]
pub struct LettreConnector {
    timeout: Option<Duration>,
}

impl LettreConnector {
    /// No I/O timeout: a hung server blocks the caller.
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Bound every connect, read and write by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

#[async_trait::async_trait]
impl SmtpConnector for LettreConnector {
    type Session = LettreSession;

    async fn open(&self, host: &str, port: u16) -> Result<LettreSession, SmtpError> {
        let hello = ClientId::default();
        let conn = AsyncSmtpConnection::connect_tokio1(
            (host, port),
            self.timeout,
            &hello,
            None,
            None,
        )
        .await
        .map_err(|e| SmtpError::handshake(HandshakeStage::Connect, e))?;

        tracing::debug!(host, port, "SMTP transport opened");
        Ok(LettreSession {
            conn,
            host: host.to_string(),
            hello,
        })
    }
}

/// Open connection to a real SMTP server.
pub struct LettreSession {
    conn: AsyncSmtpConnection,
    host: String,
    hello: ClientId,
}

/// Anything that is neither an SMTP status reply nor a client-side refusal
/// means the transport went away: I/O and TLS failures, timeouts, and a reply
/// cut short by the server closing the connection.
fn is_disconnect(err: &lettre::transport::smtp::Error) -> bool {
    !(err.is_permanent() || err.is_transient() || err.is_client())
}

#[async_trait::async_trait]
impl SmtpSession for LettreSession {
    async fn ehlo(&mut self) -> Result<(), SmtpError> {
        self.conn
            .command(Ehlo::new(self.hello.clone()))
            .await
            .map(|_| ())
            .map_err(|e| SmtpError::handshake(HandshakeStage::Ehlo, e))
    }

    async fn starttls(&mut self) -> Result<(), SmtpError> {
        let tls = TlsParameters::new(self.host.clone())
            .map_err(|e| SmtpError::handshake(HandshakeStage::StartTls, e))?;
        self.conn
            .starttls(tls, &self.hello)
            .await
            .map_err(|e| SmtpError::handshake(HandshakeStage::StartTls, e))
    }

    async fn login(&mut self, user: &str, password: &str) -> Result<(), SmtpError> {
        let credentials = Credentials::new(user.to_string(), password.to_string());
        self.conn
            .auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
            .await
            .map(|_| ())
            .map_err(|e| SmtpError::handshake(HandshakeStage::Login, e))
    }

    async fn send(&mut self, envelope: &Envelope, raw: &[u8]) -> Result<(), SmtpError> {
        match self.conn.send(envelope, raw).await {
            Ok(_) => Ok(()),
            Err(e) if is_disconnect(&e) => Err(SmtpError::Disconnected(e.to_string())),
            Err(e) => Err(SmtpError::Rejected(e.to_string())),
        }
    }

    async fn quit(&mut self) -> Result<(), SmtpError> {
        self.conn
            .quit()
            .await
            .map(|_| ())
            .map_err(|e| SmtpError::Disconnected(e.to_string()))
    }
}

/// Acquires authenticated sessions. Sessions are never pooled; every call
/// performs a full handshake.
#[derive(Debug, Clone)]
pub struct ConnectionManager<C> {
    connector: C,
}

impl<C: SmtpConnector> ConnectionManager<C> {
    /// Wrap `connector`; no connection is made until a session is acquired.
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// The connector sessions are opened with.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Run the handshake, retrying from scratch up to
    /// [`MAX_CONNECT_ATTEMPTS`] times.
    ///
    /// An incomplete `config` fails immediately with
    /// [`AlertError::Config`] without touching the network.
    pub async fn acquire_session(&self, config: &EmailConfig) -> Result<C::Session, AlertError> {
        config.validate()?;

        let mut attempt = 1;
        loop {
            match self.handshake(config).await {
                Ok(session) => {
                    tracing::debug!(host = %config.host, attempt, "SMTP session established");
                    return Ok(session);
                }
                Err(e) if attempt >= MAX_CONNECT_ATTEMPTS => {
                    tracing::error!(
                        host = %config.host,
                        attempts = attempt,
                        error = %e,
                        "SMTP connection failed"
                    );
                    return Err(AlertError::Connection {
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        host = %config.host,
                        attempt,
                        max_attempts = MAX_CONNECT_ATTEMPTS,
                        error = %e,
                        "SMTP handshake failed, retrying"
                    );
                    attempt += 1;
                }
            }
        }
    }

    async fn handshake(&self, config: &EmailConfig) -> Result<C::Session, SmtpError> {
        let mut session = self.connector.open(&config.host, config.port).await?;
        session.ehlo().await?;
        session.starttls().await?;
        session.ehlo().await?;
        session.login(&config.user, &config.password).await?;
        Ok(session)
    }
}
