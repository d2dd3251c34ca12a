use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;

/// Fixed, locale-independent month names (index 0 = January).
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Output time resolution of a usage chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Minutes within one hour
    Minute,
    /// Hours within one day
    Hour,
    /// Days within one month
    Day,
    /// Months within one year
    Month,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Minute,
        Granularity::Hour,
        Granularity::Day,
        Granularity::Month,
    ];

    pub fn x_axis_label(&self) -> &'static str {
        match self {
            Granularity::Minute => "Minute",
            Granularity::Hour => "Hour",
            Granularity::Day => "Day",
            Granularity::Month => "Month",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Minute => write!(f, "minute"),
            Granularity::Hour => write!(f, "hour"),
            Granularity::Day => write!(f, "day"),
            Granularity::Month => write!(f, "month"),
        }
    }
}

impl FromStr for Granularity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" | "minutely" => Ok(Granularity::Minute),
            "hour" | "hourly" => Ok(Granularity::Hour),
            "day" | "daily" => Ok(Granularity::Day),
            "month" | "monthly" => Ok(Granularity::Month),
            other => Err(CoreError::ValidationError(format!(
                "Unknown granularity '{other}': expected minute, hour, day or month"
            ))),
        }
    }
}

/// The window a usage chart covers, carrying the key(s) its granularity needs.
///
/// Keys are passed through as given. A malformed key simply misses in the
/// store and the chart comes back empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "granularity", rename_all = "lowercase")]
pub enum TimeWindow {
    /// One hour of one day: `date` is `YYYY-MM-DD`, `hour` is `HH`
    Minute { date: String, hour: String },
    /// One day: `YYYY-MM-DD`
    Hour { date: String },
    /// One month: `YYYY-MM`
    Day { year_month: String },
    /// One year: `YYYY`
    Month { year: String },
}

impl TimeWindow {
    /// Build a window from a single string key.
    ///
    /// Minute windows use `"{date}/{hour}"`, mirroring the store path.
    pub fn from_key(granularity: Granularity, key: &str) -> Self {
        match granularity {
            Granularity::Minute => {
                let (date, hour) = key.split_once('/').unwrap_or((key, ""));
                TimeWindow::Minute {
                    date: date.to_string(),
                    hour: hour.to_string(),
                }
            }
            Granularity::Hour => TimeWindow::Hour { date: key.to_string() },
            Granularity::Day => TimeWindow::Day { year_month: key.to_string() },
            Granularity::Month => TimeWindow::Month { year: key.to_string() },
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            TimeWindow::Minute { .. } => Granularity::Minute,
            TimeWindow::Hour { .. } => Granularity::Hour,
            TimeWindow::Day { .. } => Granularity::Day,
            TimeWindow::Month { .. } => Granularity::Month,
        }
    }

    /// The key this window was built from (inverse of `from_key`).
    pub fn key(&self) -> String {
        match self {
            TimeWindow::Minute { date, hour } => format!("{date}/{hour}"),
            TimeWindow::Hour { date } => date.clone(),
            TimeWindow::Day { year_month } => year_month.clone(),
            TimeWindow::Month { year } => year.clone(),
        }
    }
}

/// Three-letter English abbreviation for a 1-based month number.
pub fn month_abbreviation(month: u32) -> Option<&'static str> {
    month_name(month).map(|name| &name[..3])
}

/// Full English month name for a 1-based month number.
pub fn month_name(month: u32) -> Option<&'static str> {
    let idx = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(idx).copied()
}
