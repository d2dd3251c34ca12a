use thiserror::Error;

/// Unified error type for the entire one-meter-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
///
/// The aggregation engine never returns this type to its callers; store
/// failures there degrade into an empty chart instead.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Store / Network ─────────────────────────────────────────────
    #[error("Store error ({backend}): {message}")]
    Store {
        backend: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Accounts ────────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    // ── Credentials ─────────────────────────────────────────────────
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token generation failed: {0}")]
    Token(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Store URLs carry the database secret as `?auth=`; never surface it.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}

impl From<argon2::password_hash::Error> for CoreError {
    fn from(e: argon2::password_hash::Error) -> Self {
        CoreError::Hashing(e.to_string())
    }
}
