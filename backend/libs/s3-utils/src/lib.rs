/// S3 media storage for EchoDraft post images
///
/// Provides the client configuration and the upload operations the
/// blog service uses as its media host.
use aws_sdk_s3::error::DisplayErrorContext;

pub mod config;
pub mod operations;

pub use config::S3Config;
pub use operations::S3Operations;

#[derive(Debug, thiserror::Error)]
pub enum S3Error {
    #[error("S3 request failed: {0}")]
    Request(String),

    #[error("invalid S3 configuration: {0}")]
    Config(String),
}

impl S3Error {
    pub(crate) fn request<E: std::error::Error>(err: E) -> Self {
        S3Error::Request(DisplayErrorContext(err).to_string())
    }
}
