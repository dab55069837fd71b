//! Error types for stack-modules

/// Result type for registry and ordering operations
pub type Result<T> = std::result::Result<T, Error>;

/// Structural errors in the module catalog.
///
/// All of these are configuration-time failures: no deployment order can
/// be produced while any of them is present.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Module '{id}' is already registered")]
    DuplicateModule { id: String },

    #[error("Unknown module: {id}")]
    UnknownModule { id: String },

    #[error("Circular dependency detected at module '{module}': {}", .cycle.join(" -> "))]
    CircularDependency { module: String, cycle: Vec<String> },

    #[error("Invalid module identifier '{id}': {reason}")]
    InvalidModuleId { id: String, reason: String },

    /// An order handed to level grouping lists a module before one of its
    /// dependencies.
    #[error("Module '{module}' is ordered before its dependency '{dependency}'")]
    OrderViolation { module: String, dependency: String },

    #[error("Failed to parse module catalog: {0}")]
    CatalogParse(#[from] toml::de::Error),
}
