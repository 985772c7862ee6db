//! vigil-alert: send test and event alerts from the command line.
//!
//! Channel settings come from the environment (and `.env`), resolved the
//! same way the library resolves them for every send.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use vigil_core::config::{load_dotenv, Config};
use vigil_notify::data::EventAlert;
use vigil_notify::{
    Attachment, DeliveryStatus, EmailAlerter, EnvCredentials, LettreConnector, SlackAlerter,
    WebappLinks,
};

// ── CLI ─────────────────────────────────────────────────────────────

/// Send alerts over Slack and email.
#[derive(Parser, Debug)]
#[command(name = "vigil-alert", version, about)]
struct Cli {
    /// Config profile; keys are looked up as {PROFILE}_{KEY} first.
    #[arg(long, env = "VIGIL_PROFILE", default_value = "")]
    profile: String,

    /// SMTP connect/read timeout in seconds (0 = none).
    #[arg(long, env = "VIGIL_SMTP_TIMEOUT", default_value_t = 0)]
    smtp_timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Post a sample alert to the Slack webhook.
    SlackTest,

    /// Send a test email.
    EmailTest {
        /// Recipient address (repeatable).
        #[arg(long = "to", required = true)]
        to: Vec<String>,

        #[arg(long, default_value = "Test alert")]
        subject: String,

        /// File to attach (repeatable).
        #[arg(long = "attach")]
        attach: Vec<PathBuf>,
    },

    /// Post an event alert to Slack.
    Event {
        #[arg(long)]
        name: String,

        #[arg(long)]
        frequency: String,

        #[arg(long)]
        message: String,

        #[arg(long)]
        overview: Option<String>,
    },
}

fn read_attachments(paths: &[PathBuf]) -> anyhow::Result<Vec<Attachment>> {
    paths
        .iter()
        .map(|path| {
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read attachment {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(Attachment::new(filename, data))
        })
        .collect()
}

fn check_slack(status: DeliveryStatus) -> anyhow::Result<()> {
    match status {
        DeliveryStatus::Delivered => {
            info!("Slack accepted the alert");
            Ok(())
        }
        DeliveryStatus::Rejected(body) => bail!("Slack rejected the alert: {body}"),
    }
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let config = Config::for_profile(&cli.profile);
    config.log_summary();

    let credentials = EnvCredentials::with_profile(cli.profile.clone());
    let links = WebappLinks::new(config.webapp_url.clone());

    match cli.command {
        Command::SlackTest => {
            let alerter = SlackAlerter::new(credentials, links);
            check_slack(alerter.connectivity_test().await?)?;
        }
        Command::EmailTest {
            to,
            subject,
            attach,
        } => {
            let connector = match cli.smtp_timeout {
                0 => LettreConnector::new(),
                secs => LettreConnector::with_timeout(Duration::from_secs(secs)),
            };
            let attachments = read_attachments(&attach)?;
            let alerter = EmailAlerter::new(credentials, connector);
            alerter
                .send_static_alert_email(
                    &to,
                    &subject,
                    "<p>This is a test alert email.</p>",
                    attachments,
                )
                .await
                .context("failed to send test email")?;
            info!(recipients = to.len(), "test email sent");
        }
        Command::Event {
            name,
            frequency,
            message,
            overview,
        } => {
            let alerter = SlackAlerter::new(credentials, links);
            let alert = EventAlert {
                alert_name: name,
                alert_frequency: frequency,
                alert_message: message,
                alert_overview: overview,
            };
            check_slack(alerter.event_alert(&alert).await?)?;
        }
    }

    Ok(())
}
