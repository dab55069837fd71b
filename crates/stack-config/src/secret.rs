//! Opaque references to secret values

use std::fmt;

use serde::{Deserialize, Serialize};

const SCHEME: &str = "secret://";

/// Handle standing in for a secret held by an external backend.
///
/// A handle never carries plaintext. It renders as
/// `secret://<backend>/<key>`, which is also its serialized form, so typed
/// module configuration can declare `SecretHandle` fields directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretHandle {
    backend: String,
    key: String,
}

impl SecretHandle {
    pub fn new(backend: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            key: key.into(),
        }
    }

    /// Name of the backend that issued this handle
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Backend-specific location of the secret
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Parse a `secret://<backend>/<key>` URI.
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix(SCHEME)?;
        let (backend, key) = rest.split_once('/')?;
        if backend.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self::new(backend, key))
    }
}

impl fmt::Display for SecretHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}/{}", self.backend, self.key)
    }
}

impl TryFrom<String> for SecretHandle {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("'{value}' is not a secret handle"))
    }
}

impl From<SecretHandle> for String {
    fn from(handle: SecretHandle) -> Self {
        handle.to_string()
    }
}
