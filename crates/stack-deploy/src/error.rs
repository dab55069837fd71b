//! Error types for stack-deploy

/// Result type for stack-deploy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while planning or running a deployment
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A module's entry point returned an error
    #[error("Module '{module}' failed: {message}")]
    ModuleExecution { module: String, message: String },

    /// A module's entry point panicked
    #[error("Module '{module}' panicked: {message}")]
    ModulePanicked { module: String, message: String },

    /// The order names a module with no implementation in the table
    #[error("No implementation registered for module '{module}'")]
    MissingImplementation { module: String },

    #[error("An implementation for module '{module}' is already registered")]
    DuplicateImplementation { module: String },

    /// A module asked for a secret but the deployment has no backend
    #[error("No secret backend is configured for this deployment")]
    SecretsUnavailable,

    // Transparent wrappers for underlying crate errors
    /// Configuration error from stack-config
    #[error(transparent)]
    Config(#[from] stack_config::Error),

    /// Secret backend error from stack-secrets
    #[error(transparent)]
    Secrets(#[from] stack_secrets::Error),

    /// Registry or ordering error from stack-modules
    #[error(transparent)]
    Modules(#[from] stack_modules::Error),
}
