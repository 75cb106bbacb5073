//! Backend storage keys.

use std::fmt;

use sha2::{Digest, Sha256};

/// Namespace prepended to every digest.
pub const KEY_PREFIX: &str = "xroad:wsdl:";

/// A fixed-length storage key derived from a logical URL.
///
/// Backends only ever see this digest, never the raw URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for a service-description URL.
    pub fn for_url(url: &str) -> Self {
        let digest = Sha256::digest(url.as_bytes());
        Self(format!("{KEY_PREFIX}{}", hex::encode(digest)))
    }

    /// The key as stored in the backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
