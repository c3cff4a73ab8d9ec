// Token Provider Port (for deterministic testing)

/// Mints admission tokens for anonymous callers (allows deterministic tokens
/// in tests). Authenticated callers bring their own stable identity instead.
pub trait TokenProvider: Send + Sync {
    /// Generate a fresh opaque token
    fn generate_token(&self) -> String;
}

/// UUID v4 provider (production)
pub struct UuidTokenProvider;

impl TokenProvider for UuidTokenProvider {
    fn generate_token(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
