//! Content block model.
//!
//! A persisted block is a closed sum type: image blocks always carry a URL.
//! The looser `SubmittedBlock` is what travels in a create/update request,
//! where an image block without a value is waiting for its file upload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a block, unique within one post and stable across edits
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for blocks created without one
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Title,
    Subtitle,
    Text,
    Image,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Title => "title",
            BlockKind::Subtitle => "subtitle",
            BlockKind::Text => "text",
            BlockKind::Image => "image",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(BlockKind::Title),
            "subtitle" => Ok(BlockKind::Subtitle),
            "text" => Ok(BlockKind::Text),
            "image" => Ok(BlockKind::Image),
            other => Err(BlockError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("unknown block type '{0}'")]
    UnknownKind(String),

    #[error("{kind} block '{id}' has no value")]
    MissingValue { id: BlockId, kind: BlockKind },
}

/// Payload of a persisted block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockBody {
    Title(String),
    Subtitle(String),
    Text(String),
    Image { url: String },
}

impl BlockBody {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockBody::Title(_) => BlockKind::Title,
            BlockBody::Subtitle(_) => BlockKind::Subtitle,
            BlockBody::Text(_) => BlockKind::Text,
            BlockBody::Image { .. } => BlockKind::Image,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            BlockBody::Title(v) | BlockBody::Subtitle(v) | BlockBody::Text(v) => v,
            BlockBody::Image { url } => url,
        }
    }
}

/// One typed unit of a persisted post body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SubmittedBlock", into = "SubmittedBlock")]
pub struct ContentBlock {
    pub id: BlockId,
    pub body: BlockBody,
}

impl ContentBlock {
    pub fn new(id: impl Into<BlockId>, body: BlockBody) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.body.kind()
    }
}

/// Wire form of a block inside a create/update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedBlock {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl SubmittedBlock {
    /// Image block whose URL is resolved server-side from an uploaded file
    pub fn is_pending_image(&self) -> bool {
        self.kind == BlockKind::Image && self.value.as_deref().map_or(true, str::is_empty)
    }
}

impl TryFrom<SubmittedBlock> for ContentBlock {
    type Error = BlockError;

    fn try_from(block: SubmittedBlock) -> Result<Self, Self::Error> {
        let SubmittedBlock { id, kind, value } = block;
        let body = match (kind, value) {
            (BlockKind::Image, Some(url)) if !url.is_empty() => BlockBody::Image { url },
            (BlockKind::Image, _) | (_, None) => {
                return Err(BlockError::MissingValue { id, kind });
            }
            (BlockKind::Title, Some(v)) => BlockBody::Title(v),
            (BlockKind::Subtitle, Some(v)) => BlockBody::Subtitle(v),
            (BlockKind::Text, Some(v)) => BlockBody::Text(v),
        };
        Ok(ContentBlock { id, body })
    }
}

impl From<ContentBlock> for SubmittedBlock {
    fn from(block: ContentBlock) -> Self {
        let kind = block.kind();
        let value = match block.body {
            BlockBody::Title(v) | BlockBody::Subtitle(v) | BlockBody::Text(v) => v,
            BlockBody::Image { url } => url,
        };
        SubmittedBlock {
            id: block.id,
            kind,
            value: Some(value),
        }
    }
}
