use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use one_meter_core::errors::CoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Core(CoreError::ValidationError(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Core(CoreError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Core(CoreError::Auth(_)) => StatusCode::UNAUTHORIZED,
            AppError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Internal failures stay in the logs.
    fn detail(&self) -> String {
        match self {
            AppError::Core(
                CoreError::ValidationError(message)
                | CoreError::Conflict(message)
                | CoreError::Auth(message),
            ) => message.clone(),
            AppError::Core(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
