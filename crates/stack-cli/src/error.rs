//! Error types for stack-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from stack-config
    #[error(transparent)]
    Config(#[from] stack_config::Error),

    /// Error from stack-modules
    #[error(transparent)]
    Modules(#[from] stack_modules::Error),

    /// Error from stack-secrets
    #[error(transparent)]
    Secrets(#[from] stack_secrets::Error),

    /// Error from stack-deploy
    #[error(transparent)]
    Deploy(#[from] stack_deploy::Error),

    /// JSON output failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
