//! Secret backend interface and the built-in in-memory backend

use std::collections::HashMap;

use parking_lot::RwLock;
use stack_config::SecretHandle;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::plaintext::Plaintext;

/// Storage for secret values, addressed by handle.
///
/// Implementations wrap a concrete secret store (a vault, a cloud secret
/// manager, an encrypted file). The resolver only ever stores plaintext
/// and fetches it back; how the value is protected is up to the backend.
pub trait SecretBackend: Send + Sync {
    /// Name embedded in every handle this backend issues
    fn name(&self) -> &str;

    /// Persist a plaintext and return a handle for it
    fn store(&self, plaintext: &Plaintext) -> Result<SecretHandle>;

    /// Retrieve the plaintext behind a handle
    fn fetch(&self, handle: &SecretHandle) -> Result<Plaintext>;
}

/// Process-local backend keeping secrets in memory.
///
/// Suitable for tests and for previewing resolved configuration; values do
/// not outlive the process.
pub struct InMemoryBackend {
    name: String,
    entries: RwLock<HashMap<String, Plaintext>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored secrets
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn check_owner(&self, handle: &SecretHandle) -> Result<()> {
        if handle.backend() != self.name {
            return Err(Error::ForeignHandle {
                handle: handle.to_string(),
                expected: handle.backend().to_string(),
                actual: self.name.clone(),
            });
        }
        Ok(())
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretBackend for InMemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn store(&self, plaintext: &Plaintext) -> Result<SecretHandle> {
        let key = Uuid::new_v4().to_string();
        self.entries.write().insert(key.clone(), plaintext.clone());
        Ok(SecretHandle::new(self.name.clone(), key))
    }

    fn fetch(&self, handle: &SecretHandle) -> Result<Plaintext> {
        self.check_owner(handle)?;
        self.entries
            .read()
            .get(handle.key())
            .cloned()
            .ok_or_else(|| Error::NotFound {
                handle: handle.to_string(),
            })
    }
}
