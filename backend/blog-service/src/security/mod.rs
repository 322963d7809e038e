pub mod password;

pub use password::{hash_secret, verify_secret};
