//! Scripted SMTP connector shared by the unit tests.

use std::sync::{Arc, Mutex};

use lettre::address::Envelope;
use vigil_core::EmailConfig;

use crate::connection::{SmtpConnector, SmtpSession};
use crate::traits::{HandshakeStage, SmtpError};

pub(crate) fn email_config() -> EmailConfig {
    EmailConfig {
        host: "smtp.example.com".to_string(),
        port: 587,
        user: "mailer".to_string(),
        password: "secret".to_string(),
        sender: "alerts@example.com".to_string(),
        debug: false,
    }
}

#[derive(Debug, Default)]
struct State {
    opens: usize,
    sends: usize,
    quits: usize,
    steps: Vec<&'static str>,
    delivered: Vec<Vec<String>>,
    handshake_failure: Option<(HandshakeStage, usize)>,
    disconnects: usize,
    reject_sends: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockConnector {
    state: Arc<Mutex<State>>,
}

impl MockConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The first `count` handshakes fail at `stage`.
    pub(crate) fn fail_handshake(self, stage: HandshakeStage, count: usize) -> Self {
        self.state.lock().unwrap().handshake_failure = Some((stage, count));
        self
    }

    /// The first `count` transmissions report a dropped connection.
    pub(crate) fn disconnect_sends(self, count: usize) -> Self {
        self.state.lock().unwrap().disconnects = count;
        self
    }

    pub(crate) fn reject_sends(self) -> Self {
        self.state.lock().unwrap().reject_sends = true;
        self
    }

    pub(crate) fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    pub(crate) fn sends(&self) -> usize {
        self.state.lock().unwrap().sends
    }

    pub(crate) fn quits(&self) -> usize {
        self.state.lock().unwrap().quits
    }

    pub(crate) fn steps(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().steps.clone()
    }

    /// Envelope recipients of every successful transmission.
    pub(crate) fn delivered(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().delivered.clone()
    }
}

#[derive(Debug)]
pub(crate) struct MockSession {
    state: Arc<Mutex<State>>,
    attempt: usize,
}

impl MockSession {
    fn step(&self, stage: HandshakeStage, name: &'static str) -> Result<(), SmtpError> {
        let mut state = self.state.lock().unwrap();
        state.steps.push(name);
        match state.handshake_failure {
            Some((failing, count)) if failing == stage && self.attempt < count => {
                Err(SmtpError::handshake(stage, "scripted failure"))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl SmtpConnector for MockConnector {
    type Session = MockSession;

    async fn open(&self, _host: &str, _port: u16) -> Result<MockSession, SmtpError> {
        let attempt = {
            let mut state = self.state.lock().unwrap();
            state.opens += 1;
            state.opens - 1
        };
        let session = MockSession {
            state: self.state.clone(),
            attempt,
        };
        session.step(HandshakeStage::Connect, "open")?;
        Ok(session)
    }
}

#[async_trait::async_trait]
impl SmtpSession for MockSession {
    async fn ehlo(&mut self) -> Result<(), SmtpError> {
        self.step(HandshakeStage::Ehlo, "ehlo")
    }

    async fn starttls(&mut self) -> Result<(), SmtpError> {
        self.step(HandshakeStage::StartTls, "starttls")
    }

    async fn login(&mut self, _user: &str, _password: &str) -> Result<(), SmtpError> {
        self.step(HandshakeStage::Login, "login")
    }

    async fn send(&mut self, envelope: &Envelope, _raw: &[u8]) -> Result<(), SmtpError> {
        let mut state = self.state.lock().unwrap();
        state.sends += 1;
        if state.reject_sends {
            return Err(SmtpError::Rejected("550 mailbox unavailable".to_string()));
        }
        if state.sends <= state.disconnects {
            return Err(SmtpError::Disconnected("connection closed".to_string()));
        }
        let recipients = envelope.to().iter().map(|a| a.to_string()).collect();
        state.delivered.push(recipients);
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), SmtpError> {
        self.state.lock().unwrap().quits += 1;
        Ok(())
    }
}
