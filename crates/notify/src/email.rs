//! HTML alert emails with optional file attachments.
//!
//! [`compose_email`] builds the MIME tree; [`EmailAlerter`] resolves the SMTP
//! settings, composes, and hands the message to the [`Dispatcher`].

use lettre::address::Envelope;
use lettre::message::header::{ContentType, Headers};
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::{Address, Message};

use crate::connection::SmtpConnector;
use crate::dispatcher::{Dispatcher, DEBUG_SINK_ADDRESS};
use crate::templating::{StaticAlertContext, TemplateRenderer};
use crate::traits::{AlertError, CredentialProvider};

/// A file to attach to an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// A fully built email, consumed by a single [`Dispatcher::send`].
#[derive(Debug)]
pub struct ComposedEmail {
    message: Message,
    sender: Address,
    attachment_count: usize,
}

impl ComposedEmail {
    /// RFC 5322 bytes as transmitted.
    pub fn formatted(&self) -> Vec<u8> {
        self.message.formatted()
    }

    pub fn headers(&self) -> &Headers {
        self.message.headers()
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    pub fn attachment_count(&self) -> usize {
        self.attachment_count
    }
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, AlertError> {
    addr.trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| AlertError::Address(format!("{addr}: {e}")))
}

/// Build a `multipart/mixed` message: one `multipart/alternative` part with
/// the HTML body, followed by one part per attachment in input order.
pub fn compose_email(
    sender: &str,
    recipients: &[String],
    subject: &str,
    html_body: &str,
    attachments: Vec<Attachment>,
) -> Result<ComposedEmail, AlertError> {
    if recipients.is_empty() {
        return Err(AlertError::Message(
            "at least one recipient is required".to_string(),
        ));
    }
    build_message(sender, recipients, subject, html_body, attachments, None)
}

/// Like [`compose_email`], but the message is addressed to `envelope_to` at
/// the SMTP level. `recipients` only fills the `To:` header and may be empty.
pub fn compose_rerouted_email(
    sender: &str,
    recipients: &[String],
    subject: &str,
    html_body: &str,
    attachments: Vec<Attachment>,
    envelope_to: &str,
) -> Result<ComposedEmail, AlertError> {
    let to = parse_mailbox(envelope_to)?.email;
    build_message(sender, recipients, subject, html_body, attachments, Some(to))
}

fn build_message(
    sender: &str,
    recipients: &[String],
    subject: &str,
    html_body: &str,
    attachments: Vec<Attachment>,
    envelope_to: Option<Address>,
) -> Result<ComposedEmail, AlertError> {
    let from = parse_mailbox(sender)?;
    let mut builder = Message::builder().from(from.clone()).subject(subject);
    for recipient in recipients {
        builder = builder.to(parse_mailbox(recipient)?);
    }
    if let Some(to) = envelope_to {
        let envelope = Envelope::new(Some(from.email.clone()), vec![to])
            .map_err(|e| AlertError::Message(e.to_string()))?;
        builder = builder.envelope(envelope);
    }

    let octet_stream: ContentType = "application/octet-stream"
        .parse()
        .map_err(|e| AlertError::Message(format!("content type: {e}")))?;

    let mut body = MultiPart::mixed()
        .multipart(MultiPart::alternative().singlepart(SinglePart::html(html_body.to_string())));

    let attachment_count = attachments.len();
    for attachment in attachments {
        body = body.singlepart(
            MimeAttachment::new(attachment.filename).body(attachment.data, octet_stream.clone()),
        );
    }

    let message = builder
        .multipart(body)
        .map_err(|e| AlertError::Message(e.to_string()))?;

    Ok(ComposedEmail {
        message,
        sender: from.email,
        attachment_count,
    })
}

/// Sends alert emails, re-resolving SMTP settings on every call.
pub struct EmailAlerter<P, C> {
    credentials: P,
    dispatcher: Dispatcher<C>,
    templates: TemplateRenderer,
}

impl<P: CredentialProvider, C: SmtpConnector> EmailAlerter<P, C> {
    pub fn new(credentials: P, connector: C) -> Self {
        Self {
            credentials,
            dispatcher: Dispatcher::new(connector),
            templates: TemplateRenderer::new(),
        }
    }

    /// Send `body` (HTML) with optional attachments to `recipients`.
    ///
    /// In debug mode the message goes to the sink address whatever
    /// `recipients` holds, including nothing at all.
    pub async fn send_static_alert_email(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
        attachments: Vec<Attachment>,
    ) -> Result<(), AlertError> {
        let config = self.credentials.email_config()?;
        let message = if config.debug {
            compose_rerouted_email(
                &config.sender,
                recipients,
                subject,
                body,
                attachments,
                DEBUG_SINK_ADDRESS,
            )?
        } else {
            compose_email(&config.sender, recipients, subject, body, attachments)?
        };

        tracing::debug!(
            channel = "email",
            subject,
            attachments = message.attachment_count(),
            "composed alert email"
        );

        self.dispatcher.send(&config, recipients, message).await
    }

    /// Render the built-in static alert template and send it.
    pub async fn send_templated_alert_email(
        &self,
        recipients: &[String],
        subject: &str,
        context: &StaticAlertContext,
        attachments: Vec<Attachment>,
    ) -> Result<(), AlertError> {
        let body = self.templates.render_static_alert(context)?;
        self.send_static_alert_email(recipients, subject, &body, attachments)
            .await
    }
}
