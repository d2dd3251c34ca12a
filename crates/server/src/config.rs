use std::{env, fmt::Display, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

use one_meter_core::models::settings::Settings;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which document store backs the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Firebase { url: String, auth: Option<String> },
    /// Process-local tree, empty at startup
    Memory,
}

#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub store_timeout: Duration,
    pub settings: Settings,
}

impl Config {
    /// Read configuration from the environment (after loading `.env`, if any).
    pub fn load() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            info!("Loaded .env file");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match try_load::<String, _>(&lookup, "STORE_BACKEND", "firebase")?
            .to_ascii_lowercase()
            .as_str()
        {
            "firebase" => StoreBackend::Firebase {
                url: lookup("FIREBASE_URL")
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(ConfigError::Missing("FIREBASE_URL"))?,
                auth: lookup("FIREBASE_AUTH").filter(|auth| !auth.is_empty()),
            },
            "memory" => {
                warn!("Using in-memory store; data is lost on shutdown");
                StoreBackend::Memory
            }
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    value: other.to_string(),
                    reason: "expected firebase or memory".to_string(),
                })
            }
        };

        let token_secret = lookup("JWT_SECRET_KEY")
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        let token_ttl_minutes: i64 = try_load(&lookup, "TOKEN_TTL_MINUTES", "1440")?;
        if token_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_MINUTES",
                value: token_ttl_minutes.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            host: try_load(&lookup, "HOST", "0.0.0.0")?,
            port: try_load(&lookup, "PORT", "8000")?,
            store,
            store_timeout: Duration::from_secs(try_load(&lookup, "STORE_TIMEOUT_SECS", "30")?),
            settings: Settings {
                token_ttl_minutes,
                token_secret,
                ..Settings::default()
            },
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.clone(),
        reason: e.to_string(),
    })
}
