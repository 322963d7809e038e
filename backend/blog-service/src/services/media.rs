/// Media host for post images
use crate::error::AppError;
use async_trait::async_trait;
use s3_utils::{operations::object_key, S3Operations};

/// An uploaded object: storage key plus the public URL stored in the post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, AppError>;
}

/// S3-backed store writing under a fixed key prefix
pub struct S3MediaStore {
    ops: S3Operations,
    folder: String,
}

impl S3MediaStore {
    pub fn new(ops: S3Operations, folder: impl Into<String>) -> Self {
        Self {
            ops,
            folder: folder.into(),
        }
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, AppError> {
        let key = object_key(&self.folder, file_name);
        let size = bytes.len();
        let url = self.ops.upload_file(&key, bytes, content_type).await?;

        tracing::debug!(key = %key, size, "image uploaded");
        Ok(StoredObject { key, url })
    }
}
