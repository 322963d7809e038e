/// S3 bucket and URL settings
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Public base URL objects are served from (CDN or bucket endpoint)
    pub base_url: String,
    /// Custom endpoint for S3-compatible stores such as MinIO
    pub endpoint: Option<String>,
    /// Path-style addressing, required by most S3-compatible stores
    pub path_style: bool,
}

impl S3Config {
    pub fn from_env() -> Result<Self, crate::S3Error> {
        let bucket = std::env::var("S3_BUCKET").unwrap_or_else(|_| "echodraft-media".to_string());
        if bucket.trim().is_empty() {
            return Err(crate::S3Error::Config("S3_BUCKET must not be empty".into()));
        }
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let base_url = std::env::var("S3_BASE_URL")
            .unwrap_or_else(|_| format!("https://{bucket}.s3.{region}.amazonaws.com"));

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint: std::env::var("S3_ENDPOINT").ok().filter(|e| !e.is_empty()),
            path_style: std::env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            bucket,
            region,
        })
    }

    /// Public URL of an object
    pub fn object_url(&self, key: &str) -> String {
        if self.path_style {
            format!("{}/{}/{}", self.base_url, self.bucket, key)
        } else {
            format!("{}/{}", self.base_url, key)
        }
    }
}
