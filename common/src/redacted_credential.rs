//! Controller credential handling with redacted Debug output.

use crate::{ErrorLocation, RedactError};

use std::fmt;

use serde::ser::Error;
use zeroize::Zeroize;

/// A controller credential that never exposes its value in logs or
/// debug output. The backing string is zeroized on drop.
#[derive(Clone, Default)]
pub struct RedactedCredential {
    inner: String,
}

impl RedactedCredential {
    pub fn new(credential: String) -> Self {
        Self { inner: credential }
    }

    /// Get the actual credential for transmission to the controller.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Credential length (safe to log).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for RedactedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedactedCredential([REDACTED])")
    }
}

impl fmt::Display for RedactedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED CREDENTIAL]")
    }
}

impl Drop for RedactedCredential {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

// Prevent accidental serialization into envelopes or state dumps.
impl serde::Serialize for RedactedCredential {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::Serialization {
            message: String::from(
                "RedactedCredential cannot be serialized - use as_str() explicitly",
            ),
            location: ErrorLocation::caller(),
        }))
    }
}
