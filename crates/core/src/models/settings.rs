use serde::{Deserialize, Serialize};

use super::user::DEFAULT_PRODUCT_ID;
use crate::security::password::HashParams;

/// Runtime settings of the core services.
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Top-level store key holding meter readings (`{root}/{product}/{date}/{hour}/{minute}`).
    pub usage_root: String,

    /// Top-level store key holding user accounts.
    pub users_root: String,

    /// Product id for accounts that sign up without one.
    pub default_product_id: String,

    /// Lifetime of issued session tokens.
    pub token_ttl_minutes: i64,

    /// HMAC key signing session tokens. Tokens cannot be issued while empty.
    #[serde(default, skip_serializing)]
    pub token_secret: String,

    pub hash_params: HashParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            usage_root: "electricity_usage".to_string(),
            users_root: "user_details".to_string(),
            default_product_id: DEFAULT_PRODUCT_ID.to_string(),
            token_ttl_minutes: 60 * 24,
            token_secret: String::new(),
            hash_params: HashParams::default(),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("usage_root", &self.usage_root)
            .field("users_root", &self.users_root)
            .field("default_product_id", &self.default_product_id)
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("token_secret", &"<redacted>")
            .field("hash_params", &self.hash_params)
            .finish()
    }
}
