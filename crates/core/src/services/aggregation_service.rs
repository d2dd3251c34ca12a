use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::errors::CoreError;
use crate::models::chart::{ChartDataPoint, ChartDataResponse};
use crate::models::granularity::{month_abbreviation, month_name, Granularity, TimeWindow};
use crate::store::join_path;
use crate::store::traits::StoreReader;

/// Turns the raw reading tree into chart-ready usage series.
///
/// Readings live at `{usage_root}/{product}/{YYYY-MM-DD}/{HH}/{MM}`. Each
/// granularity buckets one level of that tree and averages every leaf
/// reading beneath a bucket:
///
/// | granularity | bucket | reads |
/// |---|---|---|
/// | minute | each minute of one hour | one hour node |
/// | hour | each hour of one day | one day node |
/// | day | each day of one month | one node per day |
/// | month | each month of one year | one node per day of the year |
///
/// Minute windows are the exception: every child of the hour node is a
/// single reading and becomes its own point.
///
/// Failures never escape: a broken sub-window is skipped, a broken window
/// comes back as an empty chart titled "No data available ...".
pub struct AggregationService {
    store: Arc<dyn StoreReader>,
    usage_root: String,
}

/// A group of day nodes averaged into one point.
struct SubWindow {
    label: String,
    paths: Vec<String>,
}

/// Where a window's buckets come from.
enum Source {
    /// Each child of a single node is one reading, emitted as is.
    Readings { path: String },
    /// Buckets are the children of a single node.
    Children { path: String, label: fn(&str) -> String },
    /// Buckets are fixed calendar ranges, each spanning one or more day nodes.
    Calendar(Vec<SubWindow>),
}

/// How to compute and present one window.
struct Plan {
    source: Source,
    title: String,
}

impl AggregationService {
    pub fn new(store: Arc<dyn StoreReader>, usage_root: impl Into<String>) -> Self {
        Self {
            store,
            usage_root: usage_root.into(),
        }
    }

    // ── Per-granularity entry points ────────────────────────────────

    /// Minute-by-minute readings for one hour of one day.
    pub async fn minutely_usage(&self, product_id: &str, date: &str, hour: &str) -> ChartDataResponse {
        let window = TimeWindow::Minute {
            date: date.to_string(),
            hour: hour.to_string(),
        };
        self.compute_series(product_id, &window).await
    }

    /// Hourly averages for one day (`YYYY-MM-DD`).
    pub async fn hourly_usage(&self, product_id: &str, date: &str) -> ChartDataResponse {
        let window = TimeWindow::Hour { date: date.to_string() };
        self.compute_series(product_id, &window).await
    }

    /// Daily averages for one month (`YYYY-MM`).
    pub async fn daily_usage(&self, product_id: &str, year_month: &str) -> ChartDataResponse {
        let window = TimeWindow::Day {
            year_month: year_month.to_string(),
        };
        self.compute_series(product_id, &window).await
    }

    /// Monthly averages for one year (`YYYY`).
    pub async fn monthly_usage(&self, product_id: &str, year: &str) -> ChartDataResponse {
        let window = TimeWindow::Month { year: year.to_string() };
        self.compute_series(product_id, &window).await
    }

    /// Same as `compute_series`, with the window given as a single string key
    /// (see `TimeWindow::from_key`).
    pub async fn compute_series_for_key(
        &self,
        product_id: &str,
        window_key: &str,
        granularity: Granularity,
    ) -> ChartDataResponse {
        let window = TimeWindow::from_key(granularity, window_key);
        self.compute_series(product_id, &window).await
    }

    // ── Core ────────────────────────────────────────────────────────

    /// Compute the usage chart for `window`. Never fails.
    pub async fn compute_series(&self, product_id: &str, window: &TimeWindow) -> ChartDataResponse {
        let granularity = window.granularity();
        let degraded = || ChartDataResponse::degraded(degraded_title(window), granularity);

        let Some(plan) = self.plan(product_id, window) else {
            warn!(%granularity, window = %window.key(), "Unresolvable usage window");
            return degraded();
        };

        let data_points = match self.collect(&plan.source).await {
            Ok(points) => points,
            Err(e) => {
                error!(%granularity, window = %window.key(), error = %e, "Error retrieving usage data");
                return degraded();
            }
        };

        if data_points.is_empty() {
            debug!(%granularity, window = %window.key(), product_id, "No readings in window");
            return degraded();
        }

        ChartDataResponse::new(data_points, plan.title, granularity)
    }

    /// Resolve store paths, bucket labels and the title for a window.
    /// `None` when the window key cannot name a calendar range.
    fn plan(&self, product_id: &str, window: &TimeWindow) -> Option<Plan> {
        let product_root = join_path(&[self.usage_root.as_str(), product_id]);

        let plan = match window {
            TimeWindow::Minute { date, hour } => Plan {
                source: Source::Readings {
                    path: join_path(&[product_root.as_str(), date, hour]),
                },
                title: format!("Minute-by-Minute Usage on {date} at {hour}:00"),
            },

            TimeWindow::Hour { date } => Plan {
                source: Source::Children {
                    path: join_path(&[product_root.as_str(), date]),
                    label: hour_label,
                },
                title: format!("Hourly Usage on {date}"),
            },

            TimeWindow::Day { year_month } => {
                let (year, month) = parse_year_month(year_month)?;
                let sub_windows = (1..=days_in_month(year, month))
                    .map(|day| SubWindow {
                        label: format!("{day:02}"),
                        paths: vec![join_path(&[
                            product_root.as_str(),
                            &format!("{year_month}-{day:02}"),
                        ])],
                    })
                    .collect();
                Plan {
                    source: Source::Calendar(sub_windows),
                    title: format!("Daily Usage in {} {year}", month_name(month)?),
                }
            }

            TimeWindow::Month { year } => {
                let year_num: i32 = year.trim().parse().ok()?;
                let sub_windows = (1..=12u32)
                    .filter_map(|month| {
                        let paths = (1..=days_in_month(year_num, month))
                            .map(|day| {
                                join_path(&[
                                    product_root.as_str(),
                                    &format!("{year}-{month:02}-{day:02}"),
                                ])
                            })
                            .collect();
                        Some(SubWindow {
                            label: month_abbreviation(month)?.to_string(),
                            paths,
                        })
                    })
                    .collect();
                Plan {
                    source: Source::Calendar(sub_windows),
                    title: format!("Monthly Usage in {year}"),
                }
            }
        };

        Some(plan)
    }

    async fn collect(&self, source: &Source) -> Result<Vec<ChartDataPoint>, CoreError> {
        match source {
            Source::Readings { path } => {
                let node = self.store.get(path).await?;
                Ok(reading_points(node.as_ref()))
            }
            Source::Children { path, label } => {
                let node = self.store.get(path).await?;
                Ok(children_points(node.as_ref(), *label))
            }
            Source::Calendar(sub_windows) => {
                let mut points = Vec::with_capacity(sub_windows.len());
                for sub_window in sub_windows {
                    match self.sub_window_readings(sub_window).await {
                        Ok(readings) => {
                            if let Some(avg) = mean(&readings) {
                                points.push(point(&sub_window.label, avg));
                            }
                        }
                        Err(e) => {
                            warn!(bucket = %sub_window.label, error = %e, "Skipping bucket after read failure");
                        }
                    }
                }
                Ok(points)
            }
        }
    }

    /// All valid leaf readings under every day node of a sub-window.
    /// Any failed read fails the whole sub-window.
    async fn sub_window_readings(&self, sub_window: &SubWindow) -> Result<Vec<f64>, CoreError> {
        let mut readings = Vec::new();
        for path in &sub_window.paths {
            if let Some(day) = self.store.get(path).await? {
                for (_, hour) in time_children(Some(&day)) {
                    collect_readings(hour, &mut readings);
                }
            }
        }
        Ok(readings)
    }
}

fn degraded_title(window: &TimeWindow) -> String {
    match window {
        TimeWindow::Minute { date, hour } => format!("No data available for {date} at {hour}:00"),
        TimeWindow::Hour { date } => format!("No data available for {date}"),
        TimeWindow::Day { year_month } => format!("No data available for {year_month}"),
        TimeWindow::Month { year } => format!("No data available for {year}"),
    }
}

// ── Tree walking ────────────────────────────────────────────────────

/// One point per time-keyed child of `node` holding a usable reading.
/// Nested values are not readings and are dropped.
fn reading_points(node: Option<&Value>) -> Vec<ChartDataPoint> {
    let mut points = Vec::new();
    for (key, child) in time_children(node) {
        match reading(child) {
            Some(value) => points.push(point(&key, value)),
            None => debug!(key = %key, value = %child, "Skipping invalid reading"),
        }
    }
    points
}

/// One point per time-keyed child of `node`, averaging everything beneath it.
///
/// Object children are visited in key order (zero-padded keys sort
/// chronologically); array children use their index as a two-digit key.
fn children_points(node: Option<&Value>, label: fn(&str) -> String) -> Vec<ChartDataPoint> {
    let mut points = Vec::new();
    for (key, child) in time_children(node) {
        let mut readings = Vec::new();
        collect_readings(child, &mut readings);
        match mean(&readings) {
            Some(avg) => points.push(point(&label(&key), avg)),
            None => debug!(key = %key, value = %child, "Skipping bucket without valid readings"),
        }
    }
    points
}

/// Children of a node whose keys are time keys, in chronological order.
fn time_children(node: Option<&Value>) -> Vec<(String, &Value)> {
    match node {
        Some(Value::Object(map)) => {
            let mut children: Vec<(String, &Value)> = map
                .iter()
                .filter(|(key, _)| is_time_key(key))
                .map(|(key, value)| (key.clone(), value))
                .collect();
            children.sort_by(|a, b| a.0.cmp(&b.0));
            children
        }
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(idx, value)| (format!("{idx:02}"), value))
            .collect(),
        _ => Vec::new(),
    }
}

/// Flatten every leaf under `node` into `out`, dropping anything that is
/// not a usable number. Every key counts below a bucket.
fn collect_readings(node: &Value, out: &mut Vec<f64>) {
    match node {
        Value::Object(map) => {
            for child in map.values() {
                collect_readings(child, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_readings(child, out);
            }
        }
        leaf => {
            if let Some(value) = reading(leaf) {
                out.push(value);
            }
        }
    }
}

/// A bucket key is made of ASCII digits only (`"07"`, `"13"`), so siblings
/// such as `connection_status` never become buckets.
fn is_time_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Interpret a leaf as a reading. Numbers and numeric strings count; null,
/// booleans, garbage and non-finite values are missing.
pub fn reading(leaf: &Value) -> Option<f64> {
    let value = match leaf {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

// ── Numbers & labels ────────────────────────────────────────────────

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Round to 2 decimal places.
///
/// Works from the exact decimal expansion of `value`, so `2.675` (stored as
/// `2.67499...`) gives `2.67`, and an exact tie such as `0.125` goes to the
/// even digit.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

fn point(label: &str, value: f64) -> ChartDataPoint {
    ChartDataPoint {
        label: label.to_string(),
        value: round2(value),
    }
}

fn hour_label(key: &str) -> String {
    format!("{key}:00")
}

/// `"2024-03"` → `(2024, 3)`. Month must be 1–12.
fn parse_year_month(year_month: &str) -> Option<(i32, u32)> {
    let (year, month) = year_month.trim().split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

/// Number of days in a Gregorian month; 0 for an invalid year/month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next_first
        .map(|next| (next - first).num_days() as u32)
        .unwrap_or(0)
}
