//! HTTP front of One Meter.
//!
//! | route | purpose |
//! |---|---|
//! | `POST /auth/signup`, `POST /auth/signin` | accounts |
//! | `POST /electricity/{minutely,hourly,daily,monthly}` | usage charts, JSON body |
//! | `GET /electricity/{granularity}/{product_id}/...` | usage charts, path params |
//! | `GET /`, `GET /health` | liveness |
//!
//! Configuration comes from the environment, see [`config::Config`].
//! Logging goes through `tracing`; set `RUST_LOG` to tune it.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use config::Config;
use routes::{auth, electricity, health_handler, root_handler};
use state::AppState;

/// Install the global `tracing` subscriber (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = fmt().with_env_filter(filter).try_init();
}

/// The full API router over a prepared state.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup_handler))
        .route("/signin", post(auth::signin_handler));

    let electricity_routes = Router::new()
        .route("/minutely", post(electricity::minutely_handler))
        .route("/hourly", post(electricity::hourly_handler))
        .route("/daily", post(electricity::daily_handler))
        .route("/monthly", post(electricity::monthly_handler))
        .route(
            "/minutely/{product_id}/{date}/{hour}",
            get(electricity::minutely_path_handler),
        )
        .route("/hourly/{product_id}/{date}", get(electricity::hourly_path_handler))
        .route("/daily/{product_id}/{year_month}", get(electricity::daily_path_handler))
        .route("/monthly/{product_id}/{year}", get(electricity::monthly_path_handler));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .nest("/auth", auth_routes)
        .nest("/electricity", electricity_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    info!("Initializing state...");
    let state = AppState::new(&config).context("Failed to initialize store")?;

    info!("Starting server...");
    let router = app(state);

    let address = config.address();
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
