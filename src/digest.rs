//! Content digests for verification
//!
//! Every equality check in the harness is byte-exact: two files are
//! equivalent iff their SHA-256 digests match. There is no partial or
//! fuzzy equivalence.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// A lowercase hex-encoded SHA-256 digest of a file's exact bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Digest(String);

// Deserialization goes through `from_hex` so a manifest written with
// uppercase hex compares equal to a computed digest.
impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        Ok(Digest::from_hex(&hex))
    }
}

impl Digest {
    /// Wrap an already hex-encoded digest string, normalizing case.
    pub fn from_hex(hex: &str) -> Self {
        Digest(hex.to_ascii_lowercase())
    }

    /// The hex representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash a byte slice.
pub fn hash_bytes(bytes: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Digest(hex::encode(hasher.finalize()))
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> io::Result<Digest> {
    let contents = fs::read(path)?;
    Ok(hash_bytes(&contents))
}
