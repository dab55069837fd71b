//! Error types for stack-config

use std::path::PathBuf;

/// Result type for stack-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or merging configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A later layer holds a value that cannot be reconciled with the
    /// value already merged at the same path.
    #[error(
        "Merge conflict in layer '{layer}' at '{path}': cannot merge {incoming} over {existing}"
    )]
    MergeConflict {
        layer: String,
        path: String,
        existing: &'static str,
        incoming: &'static str,
    },

    /// A configuration source could not be parsed
    #[error("Failed to parse {origin}: {message}")]
    Parse { origin: String, message: String },

    /// The file extension does not map to a known configuration format
    #[error("Unsupported configuration format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// A module's configuration slice does not match its expected shape
    #[error("Invalid configuration for module '{module}': {message}")]
    InvalidModuleConfig { module: String, message: String },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
