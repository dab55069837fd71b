//! Secure value handling for Stack Manager.
//!
//! Configuration files may mark values as secure (`{ secure = "..." }`).
//! Before any module sees its configuration, the [`SecretResolver`] moves
//! every such plaintext into a [`SecretBackend`] and leaves a
//! [`SecretHandle`](stack_config::SecretHandle) in its place. A module that
//! needs the plaintext must ask for it explicitly via
//! [`SecretResolver::dereference`].

pub mod backend;
pub mod error;
pub mod plaintext;
pub mod resolver;

pub use backend::{InMemoryBackend, SecretBackend};
pub use error::{Error, Result};
pub use plaintext::Plaintext;
pub use resolver::SecretResolver;
