//! Slack incoming-webhook delivery and the alert block layouts.
//!
//! Every layout starts with a header block and ends with at most one
//! actions block of link buttons. A webhook that answers with anything other
//! than the literal body `ok` is reported as [`DeliveryStatus::Rejected`]
//! rather than as an error, so callers can log or display the reason.

use serde::Serialize;
use vigil_core::{ChannelKind, ConfigError, SlackConfig};

use crate::blocks::{Block, BlockBuilder, Element, Text};
use crate::data::{AlertsIndividualData, AlertsReportData, EventAlert, KpiStatsAlert};
use crate::formatter::format_anomalies;
use crate::traits::{AlertError, CredentialProvider, LinkBuilder};

const NO_ANOMALIES: &str = "_No anomalies to report._";

/// Outcome of a webhook call that reached Slack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    /// Slack answered, but not with `ok`. Holds the raw response body.
    Rejected(String),
}

impl DeliveryStatus {
    pub fn from_body(body: String) -> Self {
        if body == "ok" {
            DeliveryStatus::Delivered
        } else {
            DeliveryStatus::Rejected(body)
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered)
    }

    /// Response body of a rejected call.
    pub fn failure(&self) -> Option<&str> {
        match self {
            DeliveryStatus::Delivered => None,
            DeliveryStatus::Rejected(body) => Some(body),
        }
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "<[Block]>::is_empty")]
    blocks: &'a [Block],
}

/// Posts payloads to one incoming-webhook URL.
#[derive(Debug)]
pub struct WebhookClient {
    /// Incoming-webhook URL, trimmed.
    url: String,
    /// HTTP client for the POST requests.
    client: reqwest::Client,
}

impl WebhookClient {
    /// Client for the configured webhook. An empty URL is
    /// [`ConfigError::Unconfigured`].
    pub fn from_config(config: &SlackConfig) -> Result<Self, AlertError> {
        let url = config.webhook_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Unconfigured(ChannelKind::Slack).into());
        }
        Ok(Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// POST `blocks` with a notification fallback text. Returns the raw
    /// response body.
    pub async fn post_blocks(&self, blocks: &[Block], text: Option<&str>) -> Result<String, AlertError> {
        self.post(&WebhookPayload { text, blocks }).await
    }

    /// POST a plain text message.
    pub async fn post_text(&self, text: &str) -> Result<String, AlertError> {
        self.post(&WebhookPayload {
            text: Some(text),
            blocks: &[],
        })
        .await
    }

    async fn post(&self, payload: &WebhookPayload<'_>) -> Result<String, AlertError> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%status, blocks = payload.blocks.len(), "Slack webhook responded");
        Ok(body)
    }
}

/// Sends the alert layouts, resolving the webhook URL on every call.
pub struct SlackAlerter<P, L> {
    /// Resolves the webhook URL before every post.
    credentials: P,
    /// Builds the dashboard links in buttons and KPI names.
    links: L,
}

impl<P: CredentialProvider, L: LinkBuilder> SlackAlerter<P, L> {
    pub fn new(credentials: P, links: L) -> Self {
        Self { credentials, links }
    }

    fn client(&self) -> Result<WebhookClient, AlertError> {
        let config = self.credentials.slack_config()?;
        WebhookClient::from_config(&config)
    }

    async fn deliver(
        &self,
        kind: &'static str,
        blocks: Vec<Block>,
        fallback: &str,
    ) -> Result<DeliveryStatus, AlertError> {
        let client = self.client()?;
        let body = client.post_blocks(&blocks, Some(fallback)).await?;
        let status = DeliveryStatus::from_body(body);
        match &status {
            DeliveryStatus::Delivered => {
                tracing::info!(channel = "slack", kind, "Slack alert delivered")
            }
            DeliveryStatus::Rejected(body) => {
                tracing::warn!(channel = "slack", kind, body = %body, "Slack rejected alert")
            }
        }
        Ok(status)
    }

    pub async fn anomaly_alert(&self, data: &AlertsIndividualData) -> Result<DeliveryStatus, AlertError> {
        let blocks = anomaly_alert_blocks(data, &self.links);
        let fallback = format!("Anomaly Alert: {}", data.alert_name);
        self.deliver("anomaly", blocks, &fallback).await
    }

    pub async fn digest(&self, data: &AlertsReportData) -> Result<DeliveryStatus, AlertError> {
        let blocks = digest_blocks(data, &self.links);
        let fallback = format!("Daily Alerts Report ({})", data.report_date_formatted());
        self.deliver("digest", blocks, &fallback).await
    }

    pub async fn event_alert(&self, alert: &EventAlert) -> Result<DeliveryStatus, AlertError> {
        let blocks = event_alert_blocks(alert);
        let fallback = format!("Event Alert: {}", alert.alert_name);
        self.deliver("event", blocks, &fallback).await
    }

    pub async fn kpi_stats_alert(&self, alert: &KpiStatsAlert) -> Result<DeliveryStatus, AlertError> {
        let blocks = kpi_stats_blocks(alert);
        let fallback = format!("Alert: {}", alert.alert_name);
        self.deliver("kpi_stats", blocks, &fallback).await
    }

    /// Post a sample alert to verify the webhook.
    pub async fn connectivity_test(&self) -> Result<DeliveryStatus, AlertError> {
        let blocks = connectivity_test_blocks(&self.links);
        self.deliver("test", blocks, "Test alert").await
    }

    /// Post a preformatted text table.
    pub async fn table(&self, table: &str) -> Result<DeliveryStatus, AlertError> {
        let client = self.client()?;
        Ok(DeliveryStatus::from_body(client.post_text(table).await?))
    }
}

fn anomalies_text(text: String) -> String {
    if text.is_empty() {
        NO_ANOMALIES.to_string()
    } else {
        text
    }
}

pub fn anomaly_alert_blocks(data: &AlertsIndividualData, links: &dyn LinkBuilder) -> Vec<Block> {
    let anomalies = format_anomalies(&data.top_overall_points, Some(&data.kpi_name), false, links);
    BlockBuilder::new()
        .header(format!(
            "{} - {} ({})",
            data.alert_name,
            data.kpi_name,
            data.date_formatted()
        ))
        .divider()
        .header("Alert Message")
        .markdown(format!("{}\n", data.alert_message))
        .divider()
        .header("Anomalies")
        .markdown(anomalies_text(anomalies))
        .actions(vec![
            Element::link_button("View KPI", links.kpi_link(data.kpi_id), "kpi_link"),
            Element::link_button(
                "Alerts Dashboard",
                links.alert_dashboard_link(),
                "alert_dashboard",
            ),
        ])
        .build()
}

pub fn digest_blocks(data: &AlertsReportData, links: &dyn LinkBuilder) -> Vec<Block> {
    let anomalies = format_anomalies(&data.top_anomalies, None, true, links);
    BlockBuilder::new()
        .header(format!(
            "Daily Alerts Report ({})",
            data.report_date_formatted()
        ))
        .divider()
        .header("Top Anomalies")
        .markdown(anomalies_text(anomalies))
        .actions(vec![Element::link_button(
            "Alerts Dashboard",
            links.alert_dashboard_link(),
            "alert_dashboard",
        )])
        .build()
}

pub fn event_alert_blocks(alert: &EventAlert) -> Vec<Block> {
    let mut builder = BlockBuilder::new()
        .header(format!("Alert: {}", alert.alert_name))
        .markdown(format!("Alert Frequency : {}", alert.alert_frequency))
        .markdown(format!("Alert Message : {}", alert.alert_message));
    if let Some(overview) = alert.alert_overview.as_deref().filter(|o| !o.is_empty()) {
        builder = builder.markdown(format!("Alert Overview : {}", overview));
    }
    builder.build()
}

pub fn kpi_stats_blocks(alert: &KpiStatsAlert) -> Vec<Block> {
    let stats = &alert.stats;
    BlockBuilder::new()
        .header(format!("Alert: {}", alert.alert_name))
        .markdown(format!(
            "This is the alert generated from KPI *{}* and Data Source *{}*.",
            alert.kpi_name, alert.data_source_name
        ))
        .plain(alert.alert_body.clone())
        .divider()
        .fields(vec![
            Text::markdown(format!("*Sum:*\n{} ({})", stats.current.sum, stats.past.sum)),
            Text::markdown(format!("*Mean:*\n{} ({})", stats.current.mean, stats.past.mean)),
        ])
        .fields(vec![
            Text::markdown(format!("*Change from last week:*\n{}", stats.impact.sum)),
            Text::markdown(format!("*Change from last week:*\n{}", stats.impact.mean)),
        ])
        .build()
}

pub fn connectivity_test_blocks(links: &dyn LinkBuilder) -> Vec<Block> {
    BlockBuilder::new()
        .header("Anomaly Alert Test")
        .plain("This is a test message to verify the Slack integration.")
        .divider()
        .markdown("*KPI:*\nConversion Rate\n*Value:*\n10\n*When:*\nJuly 20")
        .actions(vec![Element::link_button(
            "Dashboard",
            links.dashboard_link(),
            "dashboard",
        )])
        .build()
}
