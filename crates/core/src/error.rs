/// Domain error shared by every layer of the wiki engine.
///
/// `Integrity` is reserved for broken ordering invariants (cycles, orphaned
/// pages, dangling pointers, a wiki without its title page). Callers must
/// treat it as fatal for the current transaction and roll back.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} '{key}'")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`] keyed by a slug, title or id.
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            key: key.into(),
        }
    }
}
