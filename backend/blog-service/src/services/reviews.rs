/// Comments with star ratings
use crate::db::{comment_repo, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::models::CommentView;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

pub const MAX_RATING: f64 = 5.0;

/// Clients send the rating either as a number or as a string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RatingValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewRequest {
    pub id: Option<Uuid>,
    pub rating: Option<RatingValue>,
    #[serde(default)]
    pub comment: String,
}

/// Normalise a rating to its stored text form. Missing or blank is "0".
pub fn normalize_rating(rating: Option<&RatingValue>) -> Result<String> {
    let value = match rating {
        None => return Ok("0".to_string()),
        Some(RatingValue::Number(n)) => *n,
        Some(RatingValue::Text(s)) if s.trim().is_empty() => return Ok("0".to_string()),
        Some(RatingValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| AppError::Validation(format!("Rating '{s}' is not a number")))?,
    };

    if !value.is_finite() || !(0.0..=MAX_RATING).contains(&value) {
        return Err(AppError::Validation("Rating must be between 0 and 5".into()));
    }

    Ok(if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    })
}

pub async fn submit(pool: &PgPool, user: &AuthenticatedUser, request: ReviewRequest) -> Result<CommentView> {
    let post_id = request
        .id
        .ok_or_else(|| AppError::Validation("Post ID is required".into()))?;
    let comment = request.comment.trim();
    if comment.is_empty() {
        return Err(AppError::Validation("Comment is required".into()));
    }
    let rating = normalize_rating(request.rating.as_ref())?;

    if user_repo::find_by_id(pool, user.id).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }
    if post_repo::find_owner(pool, post_id).await?.is_none() {
        return Err(AppError::NotFound("Blog not found".into()));
    }

    let row = comment_repo::insert(pool, user.id, post_id, comment, &rating).await?;
    tracing::info!(comment_id = %row.id, %post_id, user_id = %user.id, "review submitted");
    Ok(row.into())
}

/// Comments on a post, oldest first
pub async fn list(pool: &PgPool, post_id: Uuid) -> Result<Vec<CommentView>> {
    let rows = comment_repo::list_for_post(pool, post_id).await?;
    Ok(rows.into_iter().map(CommentView::from).collect())
}
