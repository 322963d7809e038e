/// Signup with emailed one-time codes, and password sign-in
use crate::db::{pending_signup_repo, user_repo};
use crate::error::{AppError, Result};
use crate::metrics::OTP_ISSUED_TOTAL;
use crate::models::User;
use crate::security::{hash_secret, verify_secret};
use crate::services::email::EmailService;
use chrono::{Duration, Utc};
use rand::Rng;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyOtpRequest {
    pub id: Option<Uuid>,
    #[serde(default)]
    pub otp: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub struct AuthService {
    pool: PgPool,
    email: EmailService,
    otp_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(pool: PgPool, email: EmailService, otp_ttl_minutes: i64) -> Self {
        Self {
            pool,
            email,
            otp_ttl_minutes,
        }
    }

    /// Stage a signup and email its code. Returns the pending signup id the
    /// client echoes back with the code.
    pub async fn request_otp(&self, request: SignupRequest) -> Result<Uuid> {
        let request = SignupRequest {
            username: request.username.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            password: request.password,
        };
        if request.username.is_empty() || request.email.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation("All fields are required.".into()));
        }
        request.validate()?;

        if user_repo::email_exists(&self.pool, &request.email).await? {
            return Err(AppError::BadRequest("User already exists".into()));
        }

        let code = generate_otp();
        let password_hash = hash_secret(&request.password)?;
        let otp_hash = hash_secret(&code)?;
        let expires_at = Utc::now() + Duration::minutes(self.otp_ttl_minutes);

        let id = pending_signup_repo::upsert(
            &self.pool,
            &request.username,
            &request.email,
            &password_hash,
            &otp_hash,
            expires_at,
        )
        .await?;

        self.email
            .send_otp(&request.email, &code, self.otp_ttl_minutes)
            .await?;

        OTP_ISSUED_TOTAL.inc();
        info!(signup_id = %id, email = %mask_email(&request.email), "signup code issued");
        Ok(id)
    }

    /// Consume a pending signup and create the account
    pub async fn verify_otp(&self, request: VerifyOtpRequest) -> Result<User> {
        let id = request
            .id
            .ok_or_else(|| AppError::Validation("Signup id and OTP are required".into()))?;
        let otp = request.otp.trim();
        if otp.is_empty() {
            return Err(AppError::Validation("Signup id and OTP are required".into()));
        }

        let pending = pending_signup_repo::find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Signup not found".into()))?;

        if pending.expires_at < Utc::now() {
            pending_signup_repo::delete(&self.pool, id).await?;
            return Err(AppError::BadRequest("OTP expired".into()));
        }
        if !verify_secret(otp, &pending.otp_hash)? {
            warn!(signup_id = %id, "wrong signup code");
            return Err(AppError::BadRequest("Invalid OTP".into()));
        }

        let mut tx = self.pool.begin().await?;
        let user = match user_repo::create(
            &mut *tx,
            &pending.email,
            &pending.username,
            &pending.password_hash,
        )
        .await
        {
            Ok(user) => user,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::BadRequest("User already exists".into()));
            }
            Err(e) => return Err(e.into()),
        };
        pending_signup_repo::delete(&mut *tx, id).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "account created");
        Ok(user)
    }

    pub async fn sign_in(&self, request: SignInRequest) -> Result<User> {
        let email = request.email.trim();
        if email.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation("Email and password are required".into()));
        }

        let invalid = || AppError::BadRequest("Invalid email or password".into());
        let user = user_repo::find_by_email(&self.pool, email)
            .await?
            .ok_or_else(invalid)?;
        // Accounts created by an external provider have no local password
        let hash = user.password_hash.as_deref().ok_or_else(invalid)?;

        if !verify_secret(&request.password, hash)? {
            warn!(user_id = %user.id, "sign-in with wrong password");
            return Err(invalid());
        }

        info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User> {
        user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))
    }

    pub async fn purge_expired_signups(&self) -> Result<u64> {
        Ok(pending_signup_repo::purge_expired(&self.pool).await?)
    }
}

/// Six-digit numeric code
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Mask email for logging
pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let mut chars = local.chars();
        match (chars.next(), local.chars().count()) {
            (Some(first), n) if n > 2 => format!("{}***{}", first, domain),
            _ => format!("**{}", domain),
        }
    } else {
        "***@***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_is_six_digits() {
        for _ in 0..200 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert!(!code.starts_with('0'));
        }
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("reader@example.com"), "r***@example.com");
        assert_eq!(mask_email("ab@example.com"), "**@example.com");
        assert_eq!(mask_email("nobody"), "***@***");
    }

    #[test]
    fn test_signup_rules() {
        let ok = SignupRequest {
            username: "writer".into(),
            email: "writer@example.com".into(),
            password: "hunter22".into(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = SignupRequest {
            email: "writer-at-example".into(),
            ..ok.clone()
        };
        assert!(bad_email.validate().is_err());

        let short_password = SignupRequest {
            password: "abc".into(),
            ..ok
        };
        assert!(short_password.validate().is_err());
    }
}
