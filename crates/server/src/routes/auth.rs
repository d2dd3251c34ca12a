use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use one_meter_core::models::user::{SignInResponse, SignUpResponse, UserSignIn, UserSignUp};

use crate::{error::AppError, state::AppState};

/// `POST /auth/signup`: 201 on success, 409 if the username is taken.
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserSignUp>,
) -> Result<(StatusCode, Json<SignUpResponse>), AppError> {
    let response = state.meter.signup(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /auth/signin`: username and product id; 401 on bad credentials.
pub async fn signin_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserSignIn>,
) -> Result<Json<SignInResponse>, AppError> {
    let response = state.meter.signin(payload).await?;
    Ok(Json(response))
}
