//! Plaintext wrapper that refuses to print itself

use std::fmt;

/// A secret's plaintext.
///
/// `Debug` output is redacted and there is no `Display` impl, so the value
/// cannot leak through logging by accident. Call [`expose`](Self::expose)
/// at the point of use.
#[derive(Clone, PartialEq, Eq)]
pub struct Plaintext(String);

impl Plaintext {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Plaintext([redacted])")
    }
}

impl From<String> for Plaintext {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Plaintext {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
