/// HTTP middleware
pub mod session;

pub use session::{AuthenticatedUser, CookieSettings, SessionAuth, SESSION_COOKIE};
