use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::CoreError;
use crate::models::settings::Settings;
use crate::models::user::{
    SessionToken, SignInResponse, SignUpResponse, TokenClaims, UserRecord, UserSignIn, UserSignUp,
};
use crate::security::password::{hash_password, verify_password, HashParams};
use crate::security::token::{issue_token, verify_token};
use crate::store::join_path;
use crate::store::traits::StoreWriter;

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 50;
const PASSWORD_MIN_LEN: usize = 6;

/// Same message for unknown users and wrong passwords.
const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Account registration and sign-in against `{users_root}/{username}`.
pub struct AuthService {
    store: Arc<dyn StoreWriter>,
    users_root: String,
    default_product_id: String,
    token_ttl_minutes: i64,
    token_secret: String,
    hash_params: HashParams,
}

impl AuthService {
    pub fn new(store: Arc<dyn StoreWriter>, settings: &Settings) -> Self {
        Self {
            store,
            users_root: settings.users_root.clone(),
            default_product_id: settings.default_product_id.clone(),
            token_ttl_minutes: settings.token_ttl_minutes,
            token_secret: settings.token_secret.clone(),
            hash_params: settings.hash_params,
        }
    }

    /// Register a new account.
    ///
    /// 1. Validate the request shape.
    /// 2. Reject an existing username with `CoreError::Conflict`, touching nothing.
    /// 3. Store the email, the argon2 hash of the password, and the product id.
    pub async fn signup(&self, request: UserSignUp) -> Result<SignUpResponse, CoreError> {
        validate_signup(&request)?;

        let path = self.user_path(&request.username)?;
        if self.store.exists(&path).await? {
            warn!(username = %request.username, "Sign-up rejected: username taken");
            return Err(CoreError::Conflict(format!(
                "Username {} already exists",
                request.username
            )));
        }

        let product_id = match request.product_id.trim() {
            "" => self.default_product_id.clone(),
            given => given.to_string(),
        };

        let record = UserRecord {
            email: request.email.trim().to_string(),
            password: hash_password(&request.password, &self.hash_params)?,
            product_id: Some(product_id),
        };
        let value = serde_json::to_value(&record)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize user record: {e}")))?;
        self.store.set(&path, value).await?;

        info!(username = %request.username, "User created");
        Ok(SignUpResponse {
            message: "User created successfully".to_string(),
            username: request.username,
        })
    }

    /// Check credentials and return the account's non-secret fields.
    ///
    /// No session token is attached to the response; see `issue_session_token`.
    pub async fn signin(&self, request: UserSignIn) -> Result<SignInResponse, CoreError> {
        let Some(record) = self.fetch_user(&request.username).await? else {
            warn!(username = %request.username, "Sign-in failed: unknown user");
            return Err(CoreError::Auth(INVALID_CREDENTIALS.into()));
        };

        if !verify_password(&request.password, &record.password) {
            warn!(username = %request.username, "Sign-in failed: wrong password");
            return Err(CoreError::Auth(INVALID_CREDENTIALS.into()));
        }

        info!(username = %request.username, "User signed in");
        Ok(SignInResponse {
            username: request.username,
            product_id: record.product_id,
        })
    }

    /// Whether an account exists under `username`.
    pub async fn user_exists(&self, username: &str) -> Result<bool, CoreError> {
        let path = self.user_path(username)?;
        self.store.exists(&path).await
    }

    /// Load the stored account record, if any.
    pub async fn fetch_user(&self, username: &str) -> Result<Option<UserRecord>, CoreError> {
        let path = self.user_path(username)?;
        match self.store.get(&path).await? {
            Some(value) => {
                let record = serde_json::from_value(value).map_err(|e| {
                    CoreError::Deserialization(format!("Malformed user record for {username}: {e}"))
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Issue a signed bearer token for an account.
    pub fn issue_session_token(&self, username: &str) -> Result<SessionToken, CoreError> {
        issue_token(username, self.token_ttl_minutes, &self.token_secret, Utc::now())
    }

    /// Check a token issued by `issue_session_token`. Fails with `CoreError::Auth`
    /// when the signature does not match or the token has expired.
    pub fn verify_session_token(&self, token: &str) -> Result<TokenClaims, CoreError> {
        verify_token(token, &self.token_secret, Utc::now())
    }

    /// Usernames are single path segments; anything that would escape the
    /// users subtree is refused.
    fn user_path(&self, username: &str) -> Result<String, CoreError> {
        if username.is_empty()
            || username.contains('/')
            || username.chars().any(|c| matches!(c, '.' | '#' | '$' | '[' | ']'))
        {
            return Err(CoreError::ValidationError(format!(
                "Username '{username}' contains characters not allowed in a store key"
            )));
        }
        Ok(join_path(&[self.users_root.as_str(), username]))
    }
}

fn validate_signup(request: &UserSignUp) -> Result<(), CoreError> {
    let username_len = request.username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username_len) {
        return Err(CoreError::ValidationError(format!(
            "Username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
        )));
    }

    if !is_valid_email(request.email.trim()) {
        return Err(CoreError::ValidationError(format!(
            "'{}' is not a valid email address",
            request.email
        )));
    }

    if request.password.chars().count() < PASSWORD_MIN_LEN {
        return Err(CoreError::ValidationError(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }

    Ok(())
}

/// `local@domain.tld`: one `@`, non-empty local part, a dot inside the domain,
/// no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(name, _)| !name.is_empty())
        && !domain.ends_with('.')
}
