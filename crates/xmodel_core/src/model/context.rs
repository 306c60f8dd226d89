//! Session-scoped settings consumed by record defaults.

/// Explicit runtime configuration for record construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelContext {
    /// Username of the signed-in user; seeds `owner` style defaults.
    pub current_user: Option<String>,
}

impl ModelContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(username: impl Into<String>) -> Self {
        Self {
            current_user: Some(username.into()),
        }
    }
}
