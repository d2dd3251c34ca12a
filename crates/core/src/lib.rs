pub mod errors;
pub mod models;
pub mod security;
pub mod services;
pub mod store;

use models::{
    chart::ChartDataResponse,
    granularity::{Granularity, TimeWindow},
    settings::Settings,
    user::{SessionToken, SignInResponse, SignUpResponse, TokenClaims, UserSignIn, UserSignUp},
};
use services::{aggregation_service::AggregationService, auth_service::AuthService};
use std::sync::Arc;
use store::traits::{StoreReader, StoreWriter};

use errors::CoreError;

/// Main entry point for the One Meter core library.
/// Wires the usage and account services to one document store.
#[must_use]
pub struct OneMeter {
    aggregation_service: AggregationService,
    auth_service: AuthService,
    store_name: String,
    settings: Settings,
}

impl std::fmt::Debug for OneMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneMeter")
            .field("store", &self.store_name)
            .field("usage_root", &self.settings.usage_root)
            .field("users_root", &self.settings.users_root)
            .finish()
    }
}

impl OneMeter {
    /// Build on top of `store` with explicit settings.
    pub fn new<S>(store: Arc<S>, settings: Settings) -> Self
    where
        S: StoreWriter + 'static,
    {
        let store_name = store.name().to_string();
        let reader: Arc<dyn StoreReader> = store.clone();
        let writer: Arc<dyn StoreWriter> = store;

        Self {
            aggregation_service: AggregationService::new(reader, settings.usage_root.clone()),
            auth_service: AuthService::new(writer, &settings),
            store_name,
            settings,
        }
    }

    /// Build on top of `store` with default settings.
    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: StoreWriter + 'static,
    {
        Self::new(store, Settings::default())
    }

    /// Name of the backing store (`"Firebase"`, `"Memory"`, ...).
    #[must_use]
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Accounts ────────────────────────────────────────────────────

    /// Register a new account. Fails with `CoreError::Conflict` if the username is taken.
    pub async fn signup(&self, request: UserSignUp) -> Result<SignUpResponse, CoreError> {
        self.auth_service.signup(request).await
    }

    /// Verify credentials. Fails with `CoreError::Auth` on any mismatch.
    pub async fn signin(&self, request: UserSignIn) -> Result<SignInResponse, CoreError> {
        self.auth_service.signin(request).await
    }

    /// Issue a bearer session token (not part of the sign-in response).
    pub fn issue_session_token(&self, username: &str) -> Result<SessionToken, CoreError> {
        self.auth_service.issue_session_token(username)
    }

    /// Verify a session token, returning its claims.
    pub fn verify_session_token(&self, token: &str) -> Result<TokenClaims, CoreError> {
        self.auth_service.verify_session_token(token)
    }

    // ── Usage charts ────────────────────────────────────────────────
    // These never fail: missing or unreadable data yields an empty chart.

    pub async fn compute_series(&self, product_id: &str, window: &TimeWindow) -> ChartDataResponse {
        self.aggregation_service.compute_series(product_id, window).await
    }

    pub async fn compute_series_for_key(
        &self,
        product_id: &str,
        window_key: &str,
        granularity: Granularity,
    ) -> ChartDataResponse {
        self.aggregation_service
            .compute_series_for_key(product_id, window_key, granularity)
            .await
    }

    pub async fn minutely_usage(&self, product_id: &str, date: &str, hour: &str) -> ChartDataResponse {
        self.aggregation_service.minutely_usage(product_id, date, hour).await
    }

    pub async fn hourly_usage(&self, product_id: &str, date: &str) -> ChartDataResponse {
        self.aggregation_service.hourly_usage(product_id, date).await
    }

    pub async fn daily_usage(&self, product_id: &str, year_month: &str) -> ChartDataResponse {
        self.aggregation_service.daily_usage(product_id, year_month).await
    }

    pub async fn monthly_usage(&self, product_id: &str, year: &str) -> ChartDataResponse {
        self.aggregation_service.monthly_usage(product_id, year).await
    }
}
