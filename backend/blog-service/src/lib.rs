//! EchoDraft blog service.
//!
//! Posts are ordered lists of typed content blocks stored as JSONB. Readers
//! browse, search and filter the feed; signed-in users write posts (images
//! go to S3 first), react, and review. Accounts are created through an
//! emailed one-time code and sessions live in a signed HTTP-only cookie.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod query;
pub mod security;
pub mod services;

pub use app::{configure, AppState};
pub use config::Config;
pub use error::{AppError, Result};
