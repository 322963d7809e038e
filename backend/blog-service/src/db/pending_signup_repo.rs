use crate::models::PendingSignup;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Insert or refresh the pending signup for `username`, returning its id
pub async fn upsert(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    otp_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO pending_signups (username, email, password_hash, otp_hash, expires_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE
        SET email = EXCLUDED.email,
            password_hash = EXCLUDED.password_hash,
            otp_hash = EXCLUDED.otp_hash,
            expires_at = EXCLUDED.expires_at,
            created_at = NOW()
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(otp_hash)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<PendingSignup>, sqlx::Error> {
    sqlx::query_as::<_, PendingSignup>(
        "SELECT id, username, email, password_hash, otp_hash, expires_at FROM pending_signups WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM pending_signups WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Drop signups whose code has expired
pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pending_signups WHERE expires_at < NOW()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
