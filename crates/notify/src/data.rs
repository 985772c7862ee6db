//! Read-only alert records handed over by the anomaly and digest producers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%b %d, %Y";

/// One anomalous data point, with display strings already rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPointFormatted {
    pub kpi_id: u64,
    pub kpi_name: String,
    pub y: f64,
    /// `None` when the point has no predecessor (a "new value").
    pub previous_value: Option<f64>,
    pub y_readable: String,
    pub previous_value_readable: Option<String>,
    /// Signed change, e.g. `"+20%"`.
    pub formatted_change_percent: String,
    pub is_hourly: bool,
    pub anomaly_time_only: String,
    pub previous_point_time_only: String,
}

/// Data for a single-KPI anomaly alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsIndividualData {
    pub alert_name: String,
    pub kpi_id: u64,
    pub kpi_name: String,
    pub alert_message: String,
    pub date: NaiveDate,
    pub top_overall_points: Vec<AnomalyPointFormatted>,
}

impl AlertsIndividualData {
    pub fn date_formatted(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Data for the daily digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsReportData {
    pub report_date: NaiveDate,
    pub top_anomalies: Vec<AnomalyPointFormatted>,
}

impl AlertsReportData {
    pub fn report_date_formatted(&self) -> String {
        self.report_date.format(DATE_FORMAT).to_string()
    }
}

/// A plain event alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAlert {
    pub alert_name: String,
    /// How often the alert is evaluated, e.g. `daily`.
    pub alert_frequency: String,
    pub alert_message: String,
    /// Omitted from the layout when `None` or empty.
    pub alert_overview: Option<String>,
}

/// Sum and mean of a KPI over one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SumMean {
    /// Total over the period.
    pub sum: f64,
    /// Average over the period.
    pub mean: f64,
}

/// Aggregates for the current and previous period, plus their change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiStats {
    /// The period being alerted on.
    pub current: SumMean,
    /// The same period one week earlier.
    pub past: SumMean,
    /// Change from `past` to `current`.
    pub impact: SumMean,
}

/// Data for a KPI-stats alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiStatsAlert {
    /// Name of the alert rule that fired.
    pub alert_name: String,
    /// KPI the statistics were computed for.
    pub kpi_name: String,
    /// Data source backing the KPI.
    pub data_source_name: String,
    /// Free-form message configured on the alert.
    pub alert_body: String,
    /// Aggregates shown as section fields.
    pub stats: KpiStats,
}
