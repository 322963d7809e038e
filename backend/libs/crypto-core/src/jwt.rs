//! Session tokens for EchoDraft.
//!
//! Tokens are RS256-signed JWTs carried inside the signed `token` cookie.
//! Keys are loaded once at startup through `initialize_jwt_keys` and never
//! change afterwards. There is no symmetric fallback.
//!
//! ```rust,ignore
//! use crypto_core::jwt;
//!
//! jwt::initialize_jwt_keys(&private_pem, &public_pem)?;
//! let token = jwt::generate_session_token(user_id, "reader@example.com")?;
//! let claims = jwt::validate_token(&token)?.claims;
//! ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of a session token; the cookie carrying it uses the same max-age
pub const SESSION_TOKEN_EXPIRY_DAYS: i64 = 7;

const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
    }
}

static JWT_ENCODING_KEY: OnceCell<EncodingKey> = OnceCell::new();
static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

/// Load the RSA key pair from PEM strings.
///
/// Must run before any token is issued or checked. A second call fails.
pub fn initialize_jwt_keys(private_key_pem: &str, public_key_pem: &str) -> Result<()> {
    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;
    let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

    JWT_ENCODING_KEY
        .set(encoding_key)
        .map_err(|_| anyhow!("JWT encoding key already initialized"))?;
    JWT_DECODING_KEY
        .set(decoding_key)
        .map_err(|_| anyhow!("JWT decoding key already initialized"))?;

    Ok(())
}

pub fn keys_initialized() -> bool {
    JWT_ENCODING_KEY.get().is_some() && JWT_DECODING_KEY.get().is_some()
}

fn get_encoding_key() -> Result<&'static EncodingKey> {
    JWT_ENCODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup.")
    })
}

fn get_decoding_key() -> Result<&'static DecodingKey> {
    JWT_DECODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup.")
    })
}

/// Issue a session token valid for `SESSION_TOKEN_EXPIRY_DAYS`
pub fn generate_session_token(user_id: Uuid, email: &str) -> Result<String> {
    generate_token_with_ttl(user_id, email, Duration::days(SESSION_TOKEN_EXPIRY_DAYS))
}

/// Issue a token with an explicit lifetime. A negative `ttl` yields an already
/// expired token.
pub fn generate_token_with_ttl(user_id: Uuid, email: &str, ttl: Duration) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    encode(&Header::new(JWT_ALGORITHM), &claims, get_encoding_key()?)
        .map_err(|e| anyhow!("Failed to generate session token: {e}"))
}

/// Verify signature and expiry, returning the decoded claims
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;

    decode::<Claims>(token, get_decoding_key()?, &validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))
}

/// Extract the user ID; the token is validated first
pub fn get_user_id_from_token(token: &str) -> Result<Uuid> {
    validate_token(token)?.claims.user_id()
}
