pub mod auth;
pub mod electricity;

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Welcome to One Meter API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "store": state.meter.store_name(),
    }))
}
