/// Cryptographic primitives shared by EchoDraft services
///
/// - `jwt`: RS256 session tokens
pub mod jwt;
