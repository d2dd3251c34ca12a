// ═══════════════════════════════════════════════════════════════════
// Aggregation Tests: AggregationService over an in-memory store:
// bucketing, averaging, labels, titles, degraded results
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use one_meter_core::errors::CoreError;
use one_meter_core::models::chart::Y_AXIS_LABEL;
use one_meter_core::models::granularity::{Granularity, TimeWindow};
use one_meter_core::services::aggregation_service::{days_in_month, reading, round2, AggregationService};
use one_meter_core::store::memory::MemoryStore;
use one_meter_core::store::traits::StoreReader;

const PRODUCT: &str = "1112";

fn service_with(tree: Value) -> AggregationService {
    let store = MemoryStore::from_value(json!({ "electricity_usage": { PRODUCT: tree } }));
    AggregationService::new(Arc::new(store), "electricity_usage")
}

fn values(series: &one_meter_core::models::chart::ChartDataResponse) -> Vec<f64> {
    series.data_points.iter().map(|p| p.value).collect()
}

// ═══════════════════════════════════════════════════════════════════
// Mock stores
// ═══════════════════════════════════════════════════════════════════

/// Every read fails.
struct FailingStore;

#[async_trait]
impl StoreReader for FailingStore {
    fn name(&self) -> &str {
        "FailingStore"
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, CoreError> {
        Err(CoreError::Store {
            backend: "FailingStore".into(),
            message: format!("Simulated failure reading {path}"),
        })
    }
}

/// Serves an in-memory tree, but fails reads of chosen paths and records
/// every path it was asked for.
struct FlakyStore {
    inner: MemoryStore,
    failing: HashSet<String>,
    reads: Mutex<Vec<String>>,
}

impl FlakyStore {
    fn new(tree: Value, failing: &[&str]) -> Self {
        Self {
            inner: MemoryStore::from_value(json!({ "electricity_usage": { PRODUCT: tree } })),
            failing: failing.iter().map(|p| p.to_string()).collect(),
            reads: Mutex::new(Vec::new()),
        }
    }

    fn read_count(&self) -> usize {
        self.reads.lock().unwrap().len()
    }
}

#[async_trait]
impl StoreReader for FlakyStore {
    fn name(&self) -> &str {
        "FlakyStore"
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, CoreError> {
        self.reads.lock().unwrap().push(path.to_string());
        if self.failing.contains(path) {
            return Err(CoreError::Network(format!("timeout reading {path}")));
        }
        self.inner.get(path).await
    }
}

// ═══════════════════════════════════════════════════════════════════
// Minute granularity
// ═══════════════════════════════════════════════════════════════════

mod minute {
    use super::*;

    #[tokio::test]
    async fn object_readings_pass_through_in_key_order() {
        let service = service_with(json!({
            "2024-03-01": { "13": { "10": 3.456, "00": 1.0, "05": "2.5" } }
        }));

        let series = service.minutely_usage(PRODUCT, "2024-03-01", "13").await;

        assert_eq!(series.labels(), vec!["00", "05", "10"]);
        assert_eq!(values(&series), vec![1.0, 2.5, 3.46]);
        assert_eq!(series.chart_title, "Minute-by-Minute Usage on 2024-03-01 at 13:00");
        assert_eq!(series.x_axis_label, "Minute");
        assert_eq!(series.y_axis_label, Y_AXIS_LABEL);
    }

    #[tokio::test]
    async fn array_storage_uses_index_as_label() {
        let service = service_with(json!({
            "2024-03-01": { "13": [5.0, null, 7.333] }
        }));

        let series = service.minutely_usage(PRODUCT, "2024-03-01", "13").await;

        assert_eq!(series.labels(), vec!["00", "02"]);
        assert_eq!(values(&series), vec![5.0, 7.33]);
    }

    #[tokio::test]
    async fn invalid_readings_are_dropped() {
        let service = service_with(json!({
            "2024-03-01": { "13": { "00": "bad", "01": null, "02": true, "03": 4.0 } }
        }));

        let series = service.minutely_usage(PRODUCT, "2024-03-01", "13").await;

        assert_eq!(series.labels(), vec!["03"]);
        assert_eq!(values(&series), vec![4.0]);
    }

    #[tokio::test]
    async fn nested_values_are_not_readings() {
        let service = service_with(json!({
            "2024-03-01": { "13": { "00": [1.0, 3.0], "01": { "00": 8.0 }, "02": 5.0 } }
        }));

        let series = service.minutely_usage(PRODUCT, "2024-03-01", "13").await;

        assert_eq!(series.labels(), vec!["02"]);
        assert_eq!(values(&series), vec![5.0]);
    }

    #[tokio::test]
    async fn only_nested_values_degrades() {
        let service = service_with(json!({
            "2024-03-01": { "13": [[1.0], { "00": 2.0 }] }
        }));

        let series = service.minutely_usage(PRODUCT, "2024-03-01", "13").await;

        assert!(series.is_empty());
        assert_eq!(series.chart_title, "No data available for 2024-03-01 at 13:00");
    }

    #[tokio::test]
    async fn zero_is_a_valid_reading() {
        let service = service_with(json!({
            "2024-03-01": { "13": { "00": 0, "01": 0.0 } }
        }));

        let series = service.minutely_usage(PRODUCT, "2024-03-01", "13").await;

        assert_eq!(series.labels(), vec!["00", "01"]);
        assert_eq!(values(&series), vec![0.0, 0.0]);
        assert!(!series.chart_title.contains("No data available"));
    }

    #[tokio::test]
    async fn missing_hour_degrades() {
        let service = service_with(json!({ "2024-03-01": { "13": { "00": 1.0 } } }));

        let series = service.minutely_usage(PRODUCT, "2024-03-01", "14").await;

        assert!(series.data_points.is_empty());
        assert_eq!(series.chart_title, "No data available for 2024-03-01 at 14:00");
        assert_eq!(series.x_axis_label, "Minute");
    }

    #[tokio::test]
    async fn scalar_hour_node_degrades() {
        let service = service_with(json!({ "2024-03-01": { "13": 42.0 } }));

        let series = service.minutely_usage(PRODUCT, "2024-03-01", "13").await;

        assert!(series.is_empty());
        assert!(series.chart_title.contains("No data available"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Hour granularity
// ═══════════════════════════════════════════════════════════════════

mod hour {
    use super::*;

    #[tokio::test]
    async fn invalid_and_null_minutes_are_not_counted() {
        let service = service_with(json!({
            "2024-03-01": { "07": { "00": 10.0, "15": 20.0, "30": "bad", "45": null } }
        }));

        let series = service.hourly_usage(PRODUCT, "2024-03-01").await;

        assert_eq!(series.labels(), vec!["07:00"]);
        assert_eq!(values(&series), vec![15.0]);
        assert_eq!(series.chart_title, "Hourly Usage on 2024-03-01");
        assert_eq!(series.x_axis_label, "Hour");
    }

    #[tokio::test]
    async fn non_digit_siblings_never_become_labels() {
        let service = service_with(json!({
            "2024-03-01": {
                "connection_status": "online",
                "last_seen": { "00": 99.0 },
                "00": [1.0, 3.0],
                "23": { "59": 8.0 }
            }
        }));

        let series = service.hourly_usage(PRODUCT, "2024-03-01").await;

        assert_eq!(series.labels(), vec!["00:00", "23:00"]);
        assert_eq!(values(&series), vec![2.0, 8.0]);
    }

    #[tokio::test]
    async fn every_minute_key_inside_an_hour_counts() {
        let service = service_with(json!({
            "2024-03-01": { "07": { "00": 10.0, "status": 20.0 } }
        }));

        let series = service.hourly_usage(PRODUCT, "2024-03-01").await;

        assert_eq!(series.labels(), vec!["07:00"]);
        assert_eq!(values(&series), vec![15.0]);
    }

    #[tokio::test]
    async fn hours_without_valid_readings_are_omitted() {
        let service = service_with(json!({
            "2024-03-01": {
                "01": { "00": null },
                "02": { "00": "n/a" },
                "03": { "00": 6.0 }
            }
        }));

        let series = service.hourly_usage(PRODUCT, "2024-03-01").await;

        assert_eq!(series.labels(), vec!["03:00"]);
    }

    #[tokio::test]
    async fn array_day_node_uses_index_as_hour() {
        let service = service_with(json!({
            "2024-03-01": [ { "00": 1.0 }, null, [4.0, 6.0] ]
        }));

        let series = service.hourly_usage(PRODUCT, "2024-03-01").await;

        assert_eq!(series.labels(), vec!["00:00", "02:00"]);
        assert_eq!(values(&series), vec![1.0, 5.0]);
    }

    #[tokio::test]
    async fn labels_are_chronological() {
        let service = service_with(json!({
            "2024-03-01": { "20": [1.0], "03": [1.0], "11": [1.0], "00": [1.0] }
        }));

        let series = service.hourly_usage(PRODUCT, "2024-03-01").await;

        let labels = series.labels();
        assert_eq!(labels, vec!["00:00", "03:00", "11:00", "20:00"]);
        assert!(labels.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn only_status_keys_degrades() {
        let service = service_with(json!({
            "2024-03-01": { "connection_status": "offline" }
        }));

        let series = service.hourly_usage(PRODUCT, "2024-03-01").await;

        assert!(series.is_empty());
        assert_eq!(series.chart_title, "No data available for 2024-03-01");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Day granularity
// ═══════════════════════════════════════════════════════════════════

mod day {
    use super::*;

    #[tokio::test]
    async fn days_average_every_minute_of_every_hour() {
        let service = service_with(json!({
            "2024-02-05": { "00": { "00": 4.0, "30": 6.0 }, "01": [2.0] },
            "2024-02-29": { "12": { "00": 1.0, "01": 2.0, "02": 2.0 } }
        }));

        let series = service.daily_usage(PRODUCT, "2024-02").await;

        assert_eq!(series.labels(), vec!["05", "29"]);
        assert_eq!(values(&series), vec![4.0, 1.67]);
        assert_eq!(series.chart_title, "Daily Usage in February 2024");
        assert_eq!(series.x_axis_label, "Day");
    }

    #[tokio::test]
    async fn mean_is_unweighted_across_hours() {
        // One reading in hour 00, three in hour 01: the day mean weighs every
        // reading equally, not every hour.
        let service = service_with(json!({
            "2024-02-05": { "00": [10.0], "01": [0.0, 0.0, 0.0] }
        }));

        let series = service.daily_usage(PRODUCT, "2024-02").await;

        assert_eq!(values(&series), vec![2.5]);
    }

    #[tokio::test]
    async fn status_keys_are_skipped_but_minute_keys_are_not() {
        let service = service_with(json!({
            "2024-02-05": {
                "connection_status": 100.0,
                "00": { "00": 4.0, "extra": 8.0 }
            }
        }));

        let series = service.daily_usage(PRODUCT, "2024-02").await;

        assert_eq!(values(&series), vec![6.0]);
    }

    #[tokio::test]
    async fn days_beyond_month_length_are_not_read() {
        let store = Arc::new(FlakyStore::new(json!({}), &[]));
        let service = AggregationService::new(store.clone(), "electricity_usage");

        service.daily_usage(PRODUCT, "2023-02").await;

        assert_eq!(store.read_count(), 28);
    }

    #[tokio::test]
    async fn failing_day_is_skipped() {
        let store = Arc::new(FlakyStore::new(
            json!({
                "2024-03-01": { "00": [1.0] },
                "2024-03-02": { "00": [2.0] },
                "2024-03-03": { "00": [3.0] }
            }),
            &["electricity_usage/1112/2024-03-02"],
        ));
        let service = AggregationService::new(store, "electricity_usage");

        let series = service.daily_usage(PRODUCT, "2024-03").await;

        assert_eq!(series.labels(), vec!["01", "03"]);
        assert_eq!(series.chart_title, "Daily Usage in March 2024");
    }

    #[tokio::test]
    async fn invalid_month_degrades() {
        let service = service_with(json!({ "2024-13-01": { "00": [1.0] } }));

        let series = service.daily_usage(PRODUCT, "2024-13").await;

        assert!(series.is_empty());
        assert_eq!(series.chart_title, "No data available for 2024-13");
        assert_eq!(series.x_axis_label, "Day");
    }

    #[tokio::test]
    async fn unparseable_year_month_degrades() {
        let service = service_with(json!({}));

        for key in ["", "2024", "March 2024", "2024-xx", "abcd-03"] {
            let series = service.daily_usage(PRODUCT, key).await;
            assert!(series.is_empty(), "key {key:?}");
            assert_eq!(series.chart_title, format!("No data available for {key}"));
        }
    }

    #[tokio::test]
    async fn empty_month_degrades() {
        let service = service_with(json!({ "2024-04-01": { "00": [1.0] } }));

        let series = service.daily_usage(PRODUCT, "2024-03").await;

        assert!(series.is_empty());
        assert_eq!(series.chart_title, "No data available for 2024-03");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Month granularity
// ═══════════════════════════════════════════════════════════════════

mod month {
    use super::*;

    #[tokio::test]
    async fn months_average_all_days_with_abbreviated_labels() {
        let service = service_with(json!({
            "2024-01-01": { "00": { "00": 4.0, "30": 6.0 }, "01": [2.0] },
            "2024-01-31": { "10": [8.0] },
            "2024-12-25": { "18": { "00": 1.005 } }
        }));

        let series = service.monthly_usage(PRODUCT, "2024").await;

        assert_eq!(series.labels(), vec!["Jan", "Dec"]);
        assert_eq!(values(&series), vec![5.0, 1.0]);
        assert_eq!(series.chart_title, "Monthly Usage in 2024");
        assert_eq!(series.x_axis_label, "Month");
    }

    #[tokio::test]
    async fn reads_every_day_of_the_year() {
        let store = Arc::new(FlakyStore::new(json!({}), &[]));
        let service = AggregationService::new(store.clone(), "electricity_usage");

        service.monthly_usage(PRODUCT, "2024").await;
        assert_eq!(store.read_count(), 366);
    }

    #[tokio::test]
    async fn failing_day_skips_its_month_only() {
        let store = Arc::new(FlakyStore::new(
            json!({
                "2023-05-01": { "00": [1.0] },
                "2023-05-20": { "00": [3.0] },
                "2023-06-01": { "00": [7.0] }
            }),
            &["electricity_usage/1112/2023-05-20"],
        ));
        let service = AggregationService::new(store, "electricity_usage");

        let series = service.monthly_usage(PRODUCT, "2023").await;

        assert_eq!(series.labels(), vec!["Jun"]);
        assert_eq!(values(&series), vec![7.0]);
    }

    #[tokio::test]
    async fn invalid_year_degrades() {
        let service = service_with(json!({}));

        let series = service.monthly_usage(PRODUCT, "twenty").await;

        assert!(series.is_empty());
        assert_eq!(series.chart_title, "No data available for twenty");
        assert_eq!(series.x_axis_label, "Month");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Degraded results, idempotence, parametrized entry point
// ═══════════════════════════════════════════════════════════════════

mod contract {
    use super::*;

    fn all_windows() -> Vec<TimeWindow> {
        vec![
            TimeWindow::Minute { date: "2024-03-01".into(), hour: "13".into() },
            TimeWindow::Hour { date: "2024-03-01".into() },
            TimeWindow::Day { year_month: "2024-03".into() },
            TimeWindow::Month { year: "2024".into() },
        ]
    }

    #[tokio::test]
    async fn empty_store_yields_no_data_for_every_granularity() {
        let service = AggregationService::new(Arc::new(MemoryStore::new()), "electricity_usage");

        for window in all_windows() {
            let series = service.compute_series(PRODUCT, &window).await;
            assert!(series.data_points.is_empty(), "{window:?}");
            assert!(series.chart_title.contains("No data available"), "{window:?}");
            assert_eq!(series.x_axis_label, window.granularity().x_axis_label());
        }
    }

    #[tokio::test]
    async fn store_failure_never_escapes() {
        let service = AggregationService::new(Arc::new(FailingStore), "electricity_usage");

        for window in all_windows() {
            let series = service.compute_series(PRODUCT, &window).await;
            assert!(series.data_points.is_empty(), "{window:?}");
            assert!(series.chart_title.contains("No data available"), "{window:?}");
        }
    }

    #[tokio::test]
    async fn unknown_product_yields_no_data() {
        let service = service_with(json!({ "2024-03-01": { "13": [1.0] } }));

        let series = service.minutely_usage("9999", "2024-03-01", "13").await;

        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn identical_store_state_gives_identical_output() {
        let service = service_with(json!({
            "2024-03-01": { "13": { "00": 1.111, "01": 2.222 }, "14": [3.0, "4"] }
        }));

        for window in all_windows() {
            let first = serde_json::to_string(&service.compute_series(PRODUCT, &window).await).unwrap();
            let second = serde_json::to_string(&service.compute_series(PRODUCT, &window).await).unwrap();
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn key_entry_point_matches_typed_entry_point() {
        let service = service_with(json!({
            "2024-03-01": { "13": { "00": 1.0, "30": 2.0 } }
        }));

        let by_key = service
            .compute_series_for_key(PRODUCT, "2024-03-01/13", Granularity::Minute)
            .await;
        let typed = service.minutely_usage(PRODUCT, "2024-03-01", "13").await;
        assert_eq!(by_key, typed);

        let by_key = service
            .compute_series_for_key(PRODUCT, "2024-03", Granularity::Day)
            .await;
        let typed = service.daily_usage(PRODUCT, "2024-03").await;
        assert_eq!(by_key, typed);
        assert_eq!(typed.labels(), vec!["01"]);
        assert_eq!(values(&typed), vec![1.5]);
    }

    #[tokio::test]
    async fn custom_usage_root() {
        let store = MemoryStore::from_value(json!({
            "meters": { PRODUCT: { "2024-03-01": { "00": [2.0] } } }
        }));
        let service = AggregationService::new(Arc::new(store), "meters");

        let series = service.hourly_usage(PRODUCT, "2024-03-01").await;

        assert_eq!(series.labels(), vec!["00:00"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Helpers: readings, rounding, calendar
// ═══════════════════════════════════════════════════════════════════

mod helpers {
    use super::*;

    #[test]
    fn reading_accepts_numbers_and_numeric_strings() {
        assert_eq!(reading(&json!(3)), Some(3.0));
        assert_eq!(reading(&json!(2.5)), Some(2.5));
        assert_eq!(reading(&json!(" 7.25 ")), Some(7.25));
        assert_eq!(reading(&json!(0)), Some(0.0));
        assert_eq!(reading(&json!(-1.5)), Some(-1.5));
    }

    #[test]
    fn reading_rejects_everything_else() {
        assert_eq!(reading(&json!(null)), None);
        assert_eq!(reading(&json!("bad")), None);
        assert_eq!(reading(&json!("")), None);
        assert_eq!(reading(&json!(true)), None);
        assert_eq!(reading(&json!("NaN")), None);
        assert_eq!(reading(&json!("inf")), None);
        assert_eq!(reading(&json!([1.0])), None);
        assert_eq!(reading(&json!({ "00": 1.0 })), None);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(7.333), 7.33);
        assert_eq!(round2(1.666_666), 1.67);
        assert_eq!(round2(15.0), 15.0);
        assert_eq!(round2(-2.345_6), -2.35);
    }

    #[test]
    fn round2_uses_the_stored_binary_value() {
        // 2.675 and 1.115 are stored slightly below the written decimal.
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(1.115), 1.11);
    }

    #[test]
    fn round2_exact_ties_go_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
    }

    #[test]
    fn round2_of_1_005_is_two_decimal() {
        let rounded = round2(1.005);
        assert_eq!(rounded, 1.0);
        assert_eq!(round2(rounded), rounded);
    }

    #[test]
    fn days_in_month_follows_gregorian_calendar() {
        assert_eq!(days_in_month(2024, 1), 31);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn days_in_month_is_zero_for_invalid_input() {
        assert_eq!(days_in_month(2024, 0), 0);
        assert_eq!(days_in_month(2024, 13), 0);
        assert_eq!(days_in_month(i32::MAX, 1), 0);
    }
}
