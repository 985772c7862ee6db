//! End-to-end email flow through a scripted SMTP server.

use std::sync::{Arc, Mutex};

use lettre::address::Envelope;
use vigil_core::EmailConfig;
use vigil_notify::traits::{HandshakeStage, SmtpError};
use vigil_notify::{AlertError, Attachment, EmailAlerter, SmtpConnector, SmtpSession, StaticCredentials};

/// Failures to inject, consumed in order.
#[derive(Default)]
struct Script {
    handshake_failures: usize,
    send_disconnects: usize,
    opens: usize,
    transmitted: Vec<(Vec<String>, String)>,
}

#[derive(Clone, Default)]
struct FlakyServer {
    script: Arc<Mutex<Script>>,
}

struct FlakySession {
    script: Arc<Mutex<Script>>,
}

#[async_trait::async_trait]
impl SmtpConnector for FlakyServer {
    type Session = FlakySession;

    async fn open(&self, _host: &str, _port: u16) -> Result<FlakySession, SmtpError> {
        self.script.lock().unwrap().opens += 1;
        Ok(FlakySession {
            script: self.script.clone(),
        })
    }
}

#[async_trait::async_trait]
impl SmtpSession for FlakySession {
    async fn ehlo(&mut self) -> Result<(), SmtpError> {
        Ok(())
    }

    async fn starttls(&mut self) -> Result<(), SmtpError> {
        Ok(())
    }

    async fn login(&mut self, _user: &str, _password: &str) -> Result<(), SmtpError> {
        let mut script = self.script.lock().unwrap();
        if script.handshake_failures > 0 {
            script.handshake_failures -= 1;
            return Err(SmtpError::handshake(HandshakeStage::Login, "535 try again"));
        }
        Ok(())
    }

    async fn send(&mut self, envelope: &Envelope, raw: &[u8]) -> Result<(), SmtpError> {
        let mut script = self.script.lock().unwrap();
        if script.send_disconnects > 0 {
            script.send_disconnects -= 1;
            return Err(SmtpError::Disconnected("connection reset".to_string()));
        }
        let to = envelope.to().iter().map(|a| a.to_string()).collect();
        script
            .transmitted
            .push((to, String::from_utf8_lossy(raw).into_owned()));
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), SmtpError> {
        Ok(())
    }
}

fn config(debug: bool) -> EmailConfig {
    EmailConfig {
        host: "smtp.example.com".to_string(),
        port: 587,
        user: "mailer".to_string(),
        password: "secret".to_string(),
        sender: "alerts@example.com".to_string(),
        debug,
    }
}

#[tokio::test]
async fn survives_handshake_and_disconnect_failures() {
    let server = FlakyServer::default();
    {
        let mut script = server.script.lock().unwrap();
        script.handshake_failures = 3;
        script.send_disconnects = 2;
    }

    let alerter = EmailAlerter::new(StaticCredentials::email(config(false)), server.clone());
    alerter
        .send_static_alert_email(
            &["ops@example.com".to_string(), "oncall@example.com".to_string()],
            "Revenue alert",
            "<p>Revenue dropped</p>",
            vec![
                Attachment::new("top.csv", b"kpi,value\nrevenue,10\n".to_vec()),
                Attachment::new("chart.png", vec![0x89, 0x50, 0x4e, 0x47]),
            ],
        )
        .await
        .unwrap();

    let script = server.script.lock().unwrap();
    // 3 failed handshakes + 2 disconnected sends + 1 delivery.
    assert_eq!(script.opens, 6);
    assert_eq!(script.transmitted.len(), 1);

    let (to, raw) = &script.transmitted[0];
    assert_eq!(to, &vec!["ops@example.com".to_string(), "oncall@example.com".to_string()]);
    assert!(raw.contains("Subject: Revenue alert"));
    let first = raw.find("filename=\"top.csv\"").unwrap();
    let second = raw.find("filename=\"chart.png\"").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn debug_mode_reroutes_envelope_only() {
    let server = FlakyServer::default();
    let alerter = EmailAlerter::new(StaticCredentials::email(config(true)), server.clone());
    alerter
        .send_static_alert_email(&["ceo@example.com".to_string()], "s", "<p>b</p>", Vec::new())
        .await
        .unwrap();

    let script = server.script.lock().unwrap();
    let (to, raw) = &script.transmitted[0];
    assert_eq!(to, &vec![vigil_notify::dispatcher::DEBUG_SINK_ADDRESS.to_string()]);
    assert!(raw.contains("To: ceo@example.com"));
}

#[tokio::test]
async fn persistent_disconnects_surface_as_delivery_error() {
    let server = FlakyServer::default();
    server.script.lock().unwrap().send_disconnects = 10;

    let alerter = EmailAlerter::new(StaticCredentials::email(config(false)), server.clone());
    let err = alerter
        .send_static_alert_email(&["ops@example.com".to_string()], "s", "<p>b</p>", Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AlertError::Delivery(_)), "got: {err:?}");
    assert_eq!(server.script.lock().unwrap().opens, 3);
}
