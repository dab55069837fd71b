//! Error types for stack-secrets

/// Result type for secret operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by secret backends and the resolver
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend holds no value for this handle
    #[error("Secret not found: {handle}")]
    NotFound { handle: String },

    /// The handle was issued by a different backend
    #[error("Secret {handle} belongs to backend '{expected}', not '{actual}'")]
    ForeignHandle {
        handle: String,
        expected: String,
        actual: String,
    },

    /// Backend-specific failure
    #[error("Secret backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },
}
