use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use crate::errors::CoreError;
use crate::models::user::{SessionToken, TokenClaims};

const ALGORITHM: Algorithm = Algorithm::HS256;
const INVALID_TOKEN: &str = "Invalid session token";

/// Random token id: 16 bytes from the OS, hex encoded.
fn token_id() -> Result<String, CoreError> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| CoreError::Token(format!("Failed to generate token id: {e}")))?;
    Ok(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

fn require_secret(secret: &str) -> Result<&[u8], CoreError> {
    if secret.is_empty() {
        return Err(CoreError::Token("Token signing secret is not configured".into()));
    }
    Ok(secret.as_bytes())
}

/// Issue an HS256 bearer token for `subject`, valid for `ttl_minutes` from `now`.
pub fn issue_token(
    subject: &str,
    ttl_minutes: i64,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<SessionToken, CoreError> {
    let key = EncodingKey::from_secret(require_secret(secret)?);

    if ttl_minutes <= 0 {
        return Err(CoreError::Token(format!(
            "Token lifetime must be positive, got {ttl_minutes} minutes"
        )));
    }

    let expires_at = Duration::try_minutes(ttl_minutes)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            CoreError::Token(format!("Token lifetime of {ttl_minutes} minutes is out of range"))
        })?;

    let claims = TokenClaims {
        sub: subject.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        jti: token_id()?,
    };
    let access_token = encode(&Header::new(ALGORITHM), &claims, &key)
        .map_err(|e| CoreError::Token(format!("Failed to sign token: {e}")))?;

    Ok(SessionToken {
        access_token,
        token_type: "bearer".to_string(),
        subject: claims.sub,
        expires_at,
    })
}

/// Check a token's signature and expiry as of `now`, returning its claims.
///
/// Every rejection is `CoreError::Auth`; the reason only goes to the logs.
pub fn verify_token(token: &str, secret: &str, now: DateTime<Utc>) -> Result<TokenClaims, CoreError> {
    let key = DecodingKey::from_secret(require_secret(secret)?);

    // Expiry is checked against `now` below.
    let mut validation = Validation::new(ALGORITHM);
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<TokenClaims>(token, &key, &validation)
        .map_err(|e| {
            debug!(error = %e, "Rejected session token");
            CoreError::Auth(INVALID_TOKEN.into())
        })?
        .claims;

    if now.timestamp() >= claims.exp {
        debug!(subject = %claims.sub, "Rejected expired session token");
        return Err(CoreError::Auth("Session token expired".into()));
    }

    Ok(claims)
}
