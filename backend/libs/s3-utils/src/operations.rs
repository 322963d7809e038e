/// Upload operations against the media bucket
use crate::config::S3Config;
use crate::S3Error;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct S3Operations {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Operations {
    pub fn new(client: Arc<Client>, config: S3Config) -> Self {
        Self { client, config }
    }

    /// Build a client from the ambient AWS credential chain
    pub async fn connect(config: S3Config) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self::new(Arc::new(Client::from_conf(builder.build())), config)
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Upload an object and return its public URL
    pub async fn upload_file(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, S3Error> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(S3Error::request)?;

        tracing::debug!(key, bucket = %self.config.bucket, "object uploaded");
        Ok(self.config.object_url(key))
    }

    pub async fn health_check(&self) -> Result<(), S3Error> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(S3Error::request)?;

        Ok(())
    }
}

/// Object key `<folder>/<uuid>-<file name>` with the file name reduced to
/// URL-safe characters
pub fn object_key(folder: &str, file_name: &str) -> String {
    let mut cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", ".");
    }
    let cleaned = cleaned.trim_matches('.');
    let cleaned = if cleaned.is_empty() { "upload" } else { cleaned };

    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{}-{}", Uuid::new_v4(), cleaned)
    } else {
        format!("{}/{}-{}", folder, Uuid::new_v4(), cleaned)
    }
}
