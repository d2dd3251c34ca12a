use serde::{Deserialize, Serialize};

use super::granularity::Granularity;

/// Y-axis label shared by every usage chart.
pub const Y_AXIS_LABEL: &str = "Power Consumption (W)";

/// A single bar/point of a usage chart.
///
/// The core computes the numbers; the frontend only renders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    /// Bucket label (`"07"`, `"13:00"`, `"Mar"`, ...)
    pub label: String,

    /// Average power in watts, rounded to 2 decimals
    pub value: f64,
}

/// A chart-ready usage series for one time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataResponse {
    /// Points in chronological order. Empty when the window has no data.
    pub data_points: Vec<ChartDataPoint>,

    pub chart_title: String,

    pub x_axis_label: String,

    #[serde(default = "default_y_axis_label")]
    pub y_axis_label: String,
}

fn default_y_axis_label() -> String {
    Y_AXIS_LABEL.to_string()
}

impl ChartDataResponse {
    pub fn new(data_points: Vec<ChartDataPoint>, chart_title: String, granularity: Granularity) -> Self {
        Self {
            data_points,
            chart_title,
            x_axis_label: granularity.x_axis_label().to_string(),
            y_axis_label: default_y_axis_label(),
        }
    }

    /// A well-formed series with no points, returned in place of an error.
    pub fn degraded(chart_title: String, granularity: Granularity) -> Self {
        Self::new(Vec::new(), chart_title, granularity)
    }

    pub fn is_empty(&self) -> bool {
        self.data_points.is_empty()
    }

    /// Labels in emission order (handy for assertions and logging).
    pub fn labels(&self) -> Vec<&str> {
        self.data_points.iter().map(|p| p.label.as_str()).collect()
    }
}
