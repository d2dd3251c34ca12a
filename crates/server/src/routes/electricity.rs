//! Usage chart endpoints.
//!
//! Every window is reachable both as a JSON `POST` and as a path-only `GET`.
//! These handlers never fail: missing or unreadable data comes back as an
//! empty chart titled "No data available ...".

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use one_meter_core::models::chart::ChartDataResponse;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MinutelyUsageRequest {
    pub product_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH` (00-23)
    pub hour: String,
}

#[derive(Debug, Deserialize)]
pub struct HourlyUsageRequest {
    pub product_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct DailyUsageRequest {
    pub product_id: String,
    /// `YYYY-MM`
    pub year_month: String,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyUsageRequest {
    pub product_id: String,
    /// `YYYY`
    pub year: String,
}

// ── POST ────────────────────────────────────────────────────────────

pub async fn minutely_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MinutelyUsageRequest>,
) -> Json<ChartDataResponse> {
    Json(
        state
            .meter
            .minutely_usage(&request.product_id, &request.date, &request.hour)
            .await,
    )
}

pub async fn hourly_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HourlyUsageRequest>,
) -> Json<ChartDataResponse> {
    Json(state.meter.hourly_usage(&request.product_id, &request.date).await)
}

pub async fn daily_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DailyUsageRequest>,
) -> Json<ChartDataResponse> {
    Json(
        state
            .meter
            .daily_usage(&request.product_id, &request.year_month)
            .await,
    )
}

pub async fn monthly_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MonthlyUsageRequest>,
) -> Json<ChartDataResponse> {
    Json(state.meter.monthly_usage(&request.product_id, &request.year).await)
}

// ── GET ─────────────────────────────────────────────────────────────

pub async fn minutely_path_handler(
    State(state): State<Arc<AppState>>,
    Path((product_id, date, hour)): Path<(String, String, String)>,
) -> Json<ChartDataResponse> {
    Json(state.meter.minutely_usage(&product_id, &date, &hour).await)
}

pub async fn hourly_path_handler(
    State(state): State<Arc<AppState>>,
    Path((product_id, date)): Path<(String, String)>,
) -> Json<ChartDataResponse> {
    Json(state.meter.hourly_usage(&product_id, &date).await)
}

pub async fn daily_path_handler(
    State(state): State<Arc<AppState>>,
    Path((product_id, year_month)): Path<(String, String)>,
) -> Json<ChartDataResponse> {
    Json(state.meter.daily_usage(&product_id, &year_month).await)
}

pub async fn monthly_path_handler(
    State(state): State<Arc<AppState>>,
    Path((product_id, year)): Path<(String, String)>,
) -> Json<ChartDataResponse> {
    Json(state.meter.monthly_usage(&product_id, &year).await)
}
