//! Dashboard links built from the web app's base URL.

use crate::traits::LinkBuilder;

#[derive(Debug, Clone)]
pub struct WebappLinks {
    prefix: String,
}

impl WebappLinks {
    /// `prefix` is the web app's base URL; a trailing slash is added if
    /// missing.
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { prefix }
    }
}

impl LinkBuilder for WebappLinks {
    fn kpi_link(&self, kpi_id: u64) -> String {
        format!("{}#/dashboard/0/anomaly/{}", self.prefix, kpi_id)
    }

    fn alert_dashboard_link(&self) -> String {
        format!("{}#/alerts", self.prefix)
    }

    fn dashboard_link(&self) -> String {
        format!("{}#/dashboard", self.prefix)
    }
}
