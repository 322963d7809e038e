/// Business logic between handlers and repositories
pub mod auth;
pub mod email;
pub mod media;
pub mod posts;
pub mod reactions;
pub mod reviews;

pub use auth::AuthService;
pub use email::EmailService;
pub use media::{MediaStore, S3MediaStore, StoredObject};
pub use posts::{EditView, ImageUpload, PostForm, PostService};
