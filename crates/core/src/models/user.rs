use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Product id assigned to accounts that do not name one at sign-up.
pub const DEFAULT_PRODUCT_ID: &str = "1112";

fn default_product_id() -> String {
    DEFAULT_PRODUCT_ID.to_string()
}

/// Sign-up request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSignUp {
    /// 3 to 50 characters
    pub username: String,

    pub email: String,

    /// At least 6 characters; only its hash is ever stored
    pub password: String,

    /// The meter this account reads from
    #[serde(default = "default_product_id")]
    pub product_id: String,
}

/// Sign-in request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSignIn {
    pub username: String,
    pub password: String,
}

/// What is stored under `user_details/{username}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,

    /// PHC-encoded argon2 hash
    pub password: String,

    #[serde(default)]
    pub product_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub message: String,
    pub username: String,
}

/// Non-secret account fields returned after a successful sign-in.
///
/// Carries no session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInResponse {
    pub username: String,
    pub product_id: Option<String>,
}

/// A bearer session token issued by the credential layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionToken {
    /// HS256-signed JWT carrying `TokenClaims`
    pub access_token: String,

    /// Always `"bearer"`
    pub token_type: String,

    pub subject: String,

    pub expires_at: DateTime<Utc>,
}

/// Claims inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Username the token was issued to
    pub sub: String,
    /// Issued at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Random token id (32 hex characters)
    pub jti: String,
}

impl SessionToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
