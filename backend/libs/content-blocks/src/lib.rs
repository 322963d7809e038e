/// Block-based post content shared by the blog service and its clients
///
/// # Modules
///
/// - `block`: Content block model and its wire representation
/// - `category`: Fixed post category enumeration
/// - `post`: Persisted post document as served over HTTP
/// - `preview`: Local preview handles for images awaiting upload
/// - `editor`: Working draft of one post (add/update/remove/reset)
/// - `submission`: Turns a draft into a multipart create/update payload
/// - `client`: HTTP client for the create/update protocol
pub mod block;
pub mod category;
pub mod client;
pub mod editor;
pub mod post;
pub mod preview;
pub mod submission;

pub use block::{BlockBody, BlockError, BlockId, BlockKind, ContentBlock, SubmittedBlock};
pub use category::{Category, UnknownCategory};
pub use client::{BlogClient, ClientError};
pub use editor::{Draft, DraftBlock, EditOutcome, ImageSlot, RejectReason};
pub use post::{Author, PostDocument};
pub use preview::{BlobPreviewStore, LocalFile, PreviewStore};
pub use submission::{AssembleError, PendingUpload, Submission};

/// Multipart field carrying the post category
pub const TYPE_FIELD: &str = "type";
/// Multipart field carrying the JSON-encoded content array
pub const CONTENT_FIELD: &str = "content";
/// Multipart field name repeated once per uploaded image file
pub const IMAGES_FIELD: &str = "images";
