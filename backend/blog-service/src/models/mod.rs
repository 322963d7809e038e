/// Database rows and the JSON views built from them
use crate::error::AppError;
use chrono::{DateTime, Utc};
use content_blocks::{Author, Category, ContentBlock, PostDocument};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Post joined with its author's email
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub uploaded_by: Uuid,
    pub author_email: String,
    pub block_type: String,
    pub content: Json<Vec<ContentBlock>>,
    pub likes: Vec<Uuid>,
    pub dislikes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for PostDocument {
    type Error = AppError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let block_type: Category = row.block_type.parse().map_err(|e| {
            AppError::Internal(format!("post {} has invalid category: {e}", row.id))
        })?;

        Ok(PostDocument {
            id: row.id,
            uploaded_by: Author {
                id: row.uploaded_by,
                email: row.author_email,
            },
            block_type,
            content: row.content.0,
            likes: row.likes,
            dislikes: row.dislikes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub fn into_documents(rows: Vec<PostRow>) -> Result<Vec<PostDocument>, AppError> {
    rows.into_iter().map(PostDocument::try_from).collect()
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public part of a user returned by the auth endpoints
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PendingSignup {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub otp_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Comment joined with its author's email
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub comment_by: Uuid,
    pub author_email: String,
    pub comment_for: Uuid,
    pub comment: String,
    pub rating: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub comment_by: Author,
    pub comment_for: Uuid,
    pub comment: String,
    pub rating: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            comment_by: Author {
                id: row.comment_by,
                email: row.author_email,
            },
            comment_for: row.comment_for,
            comment: row.comment,
            rating: row.rating,
            created_at: row.created_at,
        }
    }
}
