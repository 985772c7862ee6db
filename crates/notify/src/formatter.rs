//! Direction-aware summary text for lists of anomalous points.
//!
//! Every Slack alert variant renders its anomaly section through
//! [`format_anomalies`], one mrkdwn line per point.

use std::cmp::Ordering;

use crate::data::AnomalyPointFormatted;
use crate::traits::LinkBuilder;

const NEUTRAL_MARKER: &str = ":black_circle_for_record: Anomalous behavior";
const INCREASE_MARKER: &str = ":arrow_up: Spike";
const DECREASE_MARKER: &str = ":arrow_down_small: Drop";

/// How a point relates to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// No previous value at all.
    New,
    /// Same value as the previous point (also used when the values cannot
    /// be ordered, e.g. NaN).
    Constant,
    Increase,
    Decrease,
}

impl Direction {
    pub fn of(point: &AnomalyPointFormatted) -> Self {
        match point.previous_value {
            None => Direction::New,
            Some(previous) => match point.y.partial_cmp(&previous) {
                Some(Ordering::Greater) => Direction::Increase,
                Some(Ordering::Less) => Direction::Decrease,
                _ => Direction::Constant,
            },
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Direction::New | Direction::Constant => NEUTRAL_MARKER,
            Direction::Increase => INCREASE_MARKER,
            Direction::Decrease => DECREASE_MARKER,
        }
    }
}

/// Render `points` as one line each, in input order.
///
/// With `include_kpi_info` the KPI name of each point is rendered as a link
/// built by `links`. Otherwise `kpi_name` (if any) is named in plain text,
/// and with neither the line just says the anomaly was detected.
pub fn format_anomalies(
    points: &[AnomalyPointFormatted],
    kpi_name: Option<&str>,
    include_kpi_info: bool,
    links: &dyn LinkBuilder,
) -> String {
    let mut out = String::new();
    for point in points {
        out.push_str(&format_line(point, kpi_name, include_kpi_info, links));
        out.push('\n');
    }
    out
}

fn format_line(
    point: &AnomalyPointFormatted,
    kpi_name: Option<&str>,
    include_kpi_info: bool,
    links: &dyn LinkBuilder,
) -> String {
    let direction = Direction::of(point);

    let mut line = format!("- {}", direction.marker());
    line.push_str(&subject(point, kpi_name, include_kpi_info, links));

    match direction {
        Direction::New => {
            line.push_str(&format!("- changed to *{}*", point.y_readable));
            if point.is_hourly {
                line.push_str(&hourly_range(point));
            }
        }
        Direction::Constant => {
            if point.is_hourly {
                line.push_str(&format!("- with constant value *{}*", point.y_readable));
                line.push_str(&hourly_range(point));
            } else {
                line.push_str(&format!(
                    "- with same value *{}* as previous day",
                    point.y_readable
                ));
            }
        }
        Direction::Increase | Direction::Decrease => {
            line.push_str(&format!("- changed to *{}*", point.y_readable));
            if let Some(previous) = &point.previous_value_readable {
                line.push_str(&format!(
                    " from {} ({})",
                    previous, point.formatted_change_percent
                ));
            }
            if point.is_hourly {
                line.push_str(&hourly_range(point));
            }
        }
    }

    line
}

fn subject(
    point: &AnomalyPointFormatted,
    kpi_name: Option<&str>,
    include_kpi_info: bool,
    links: &dyn LinkBuilder,
) -> String {
    if include_kpi_info {
        format!(
            " in *<{}|{}>* ",
            links.kpi_link(point.kpi_id),
            point.kpi_name
        )
    } else {
        match kpi_name {
            Some(name) => format!(" in *{}* ", name),
            None => " detected ".to_string(),
        }
    }
}

fn hourly_range(point: &AnomalyPointFormatted) -> String {
    format!(
        " from {} to {}",
        point.previous_point_time_only, point.anomaly_time_only
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::WebappLinks;

    fn links() -> WebappLinks {
        WebappLinks::new("https://app.example.com/")
    }

    fn point(y: f64, previous: Option<f64>, is_hourly: bool) -> AnomalyPointFormatted {
        AnomalyPointFormatted {
            kpi_id: 7,
            kpi_name: "Revenue".to_string(),
            y,
            previous_value: previous,
            y_readable: format!("{y}"),
            previous_value_readable: previous.map(|p| format!("{p}")),
            formatted_change_percent: "+20%".to_string(),
            is_hourly,
            anomaly_time_only: "11:00".to_string(),
            previous_point_time_only: "10:00".to_string(),
        }
    }

    #[test]
    fn empty_input_gives_empty_string() {
        assert_eq!(format_anomalies(&[], None, true, &links()), "");
    }

    #[test]
    fn one_line_per_point() {
        let points = vec![
            point(120.0, Some(100.0), false),
            point(80.0, Some(100.0), true),
            point(50.0, None, true),
            point(5.0, Some(5.0), false),
        ];
        let out = format_anomalies(&points, None, false, &links());
        assert_eq!(out.lines().count(), points.len());
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn increase_with_previous_value() {
        let out = format_anomalies(&[point(120.0, Some(100.0), false)], None, false, &links());
        assert!(out.contains(":arrow_up: Spike"), "got: {out}");
        assert!(out.contains("changed to *120*"), "got: {out}");
        assert!(out.contains("from 100 (+20%)"), "got: {out}");
        assert!(!out.contains("10:00"), "got: {out}");
    }

    #[test]
    fn decrease_hourly_appends_range() {
        let mut p = point(80.0, Some(100.0), true);
        p.formatted_change_percent = "-20%".to_string();
        let out = format_anomalies(&[p], None, false, &links());
        assert!(out.contains(":arrow_down_small: Drop"), "got: {out}");
        assert!(out.contains("from 100 (-20%) from 10:00 to 11:00"), "got: {out}");
    }

    #[test]
    fn directional_without_readable_previous() {
        let mut p = point(120.0, Some(100.0), false);
        p.previous_value_readable = None;
        let out = format_anomalies(&[p], None, false, &links());
        assert_eq!(out, "- :arrow_up: Spike detected - changed to *120*\n");
    }

    #[test]
    fn new_value_hourly() {
        let out = format_anomalies(&[point(50.0, None, true)], None, false, &links());
        assert!(out.contains(":black_circle_for_record:"), "got: {out}");
        assert!(out.contains("changed to *50*"), "got: {out}");
        assert!(out.contains("from 10:00 to 11:00"), "got: {out}");
    }

    #[test]
    fn new_value_daily_has_no_range() {
        let out = format_anomalies(&[point(50.0, None, false)], None, false, &links());
        assert_eq!(
            out,
            "- :black_circle_for_record: Anomalous behavior detected - changed to *50*\n"
        );
    }

    #[test]
    fn constant_hourly() {
        let out = format_anomalies(&[point(5.0, Some(5.0), true)], None, false, &links());
        assert!(
            out.contains("- with constant value *5* from 10:00 to 11:00"),
            "got: {out}"
        );
    }

    #[test]
    fn constant_daily() {
        let out = format_anomalies(&[point(5.0, Some(5.0), false)], None, false, &links());
        assert!(out.contains("- with same value *5* as previous day"), "got: {out}");
        assert!(!out.contains("from"), "got: {out}");
    }

    #[test]
    fn kpi_info_renders_link() {
        let out = format_anomalies(&[point(120.0, Some(100.0), false)], None, true, &links());
        assert!(
            out.contains(" in *<https://app.example.com/#/dashboard/0/anomaly/7|Revenue>* "),
            "got: {out}"
        );
    }

    #[test]
    fn plain_kpi_name_without_link() {
        let out = format_anomalies(
            &[point(120.0, Some(100.0), false)],
            Some("Orders"),
            false,
            &links(),
        );
        assert!(out.contains(" in *Orders* "), "got: {out}");
        assert!(!out.contains("https://"), "got: {out}");
    }

    #[test]
    fn nan_is_treated_as_constant() {
        assert_eq!(Direction::of(&point(f64::NAN, Some(1.0), false)), Direction::Constant);
    }

    #[test]
    fn lines_keep_input_order() {
        let mut first = point(1.0, None, false);
        first.y_readable = "first".to_string();
        let mut second = point(2.0, None, false);
        second.y_readable = "second".to_string();
        let out = format_anomalies(&[first, second], None, false, &links());
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("*first*"));
        assert!(lines[1].contains("*second*"));
    }
}
