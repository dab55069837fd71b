//! Module descriptors

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Declaration of a deployable module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    id: String,
    dependencies: Vec<String>,
    enabled_by_default: bool,
}

impl ModuleDescriptor {
    /// A module with no dependencies, enabled unless configured otherwise
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dependencies: Vec::new(),
            enabled_by_default: true,
        }
    }

    /// Append dependency identifiers, ignoring repeats
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for dep in deps {
            let dep = dep.into();
            if !self.dependencies.contains(&dep) {
                self.dependencies.push(dep);
            }
        }
        self
    }

    /// Require an explicit `enabled = true` in configuration
    pub fn disabled_by_default(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }

    pub fn with_enabled_by_default(mut self, enabled: bool) -> Self {
        self.enabled_by_default = enabled;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Declared dependencies, in declaration order
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn enabled_by_default(&self) -> bool {
        self.enabled_by_default
    }

    /// Check that the identifier can double as a configuration namespace.
    ///
    /// Identifiers must be non-empty and may not contain `.` (the path
    /// separator) or whitespace.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidModuleId {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.is_empty() {
            return Err(invalid("identifier is empty"));
        }
        if self.id.contains('.') {
            return Err(invalid("identifier may not contain '.'"));
        }
        if self.id.chars().any(char::is_whitespace) {
            return Err(invalid("identifier may not contain whitespace"));
        }
        Ok(())
    }
}
