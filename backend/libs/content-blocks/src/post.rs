use crate::block::ContentBlock;
use crate::category::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author reference expanded to its email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub email: String,
}

/// A persisted blog post as served by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDocument {
    pub id: Uuid,
    pub uploaded_by: Author,
    pub block_type: Category,
    pub content: Vec<ContentBlock>,
    pub likes: Vec<Uuid>,
    pub dislikes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
