/// HTTP handlers
pub mod admin;
pub mod auth;
pub mod blogs;
pub mod health;
pub mod multipart;

use crate::error::{AppError, Result};
use uuid::Uuid;

/// Parse a post id from a path segment
pub(crate) fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest("Invalid blog ID".to_string()))
}
