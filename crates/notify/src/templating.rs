//! Minijinja rendering of HTML alert email bodies.
//!
//! Built-in templates are registered under `.html` names so minijinja
//! applies HTML auto-escaping to every interpolated value.

use crate::traits::AlertError;

const STATIC_ALERT_NAME: &str = "static_alert.html";

const STATIC_ALERT_SOURCE: &str = r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #222;">
  <h2>{{ alert_name }}</h2>
  {% if kpi_name %}<p><strong>KPI:</strong> {{ kpi_name }}{% if data_source_name %} ({{ data_source_name }}){% endif %}</p>{% endif %}
  <p>{{ alert_message }}</p>
  {% if alert_overview %}<h3>Overview</h3>
  <p>{{ alert_overview }}</p>{% endif %}
</body>
</html>
"#;

/// Values available to the static alert template.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StaticAlertContext {
    pub alert_name: String,
    pub alert_message: String,
    pub kpi_name: Option<String>,
    pub data_source_name: Option<String>,
    pub alert_overview: Option<String>,
}

/// Renders alert email bodies.
#[derive(Debug)]
pub struct TemplateRenderer {
    env: minijinja::Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = minijinja::Environment::new();
        if let Err(e) = env.add_template(STATIC_ALERT_NAME, STATIC_ALERT_SOURCE) {
            tracing::error!(error = %e, "built-in alert template failed to parse");
        }
        Self { env }
    }

    /// Render the built-in static alert template.
    pub fn render_static_alert(&self, ctx: &StaticAlertContext) -> Result<String, AlertError> {
        self.render(STATIC_ALERT_NAME, ctx)
    }

    /// Render a registered template by name.
    pub fn render<S: serde::Serialize>(&self, name: &str, ctx: &S) -> Result<String, AlertError> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| AlertError::Template(e.to_string()))?;
        template
            .render(ctx)
            .map_err(|e| AlertError::Template(e.to_string()))
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}
