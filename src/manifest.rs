//! Hashes manifest (hashes.json)
//!
//! The manifest is an ordered array of entries, each naming an asset
//! (relative to the game root), the compound type chain to apply, the
//! digest of the untouched source, and the expected final digest(s).
//! The expectation shape is resolved once at load time: either a single
//! whole-file digest or an ordered list of per-member filename/digest
//! pairs.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

use crate::digest::Digest;

/// Errors while loading the hashes manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read hashes file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse hashes file: {0}")]
    Json(#[from] serde_json::Error),
}

/// One expected member of a multi-file stage output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberHash {
    pub filename: String,
    pub hash: Digest,
}

/// The expected final content of an entry's pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExpectedHash {
    /// The whole output file must match this digest.
    Single(Digest),
    /// Every produced member must match its named digest; order is the
    /// manifest author's order and the first element doubles as the
    /// intermediate artifact for chained codec stages.
    PerMember(Vec<MemberHash>),
}

impl ExpectedHash {
    /// The first member of a list expectation, if this is one.
    pub fn first_member(&self) -> Option<&MemberHash> {
        match self {
            ExpectedHash::Single(_) => None,
            ExpectedHash::PerMember(members) => members.first(),
        }
    }
}

/// One asset under test. Immutable once loaded; consumed once per run.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    /// Asset path relative to the game root.
    pub path: String,

    /// Compound type descriptor, e.g. `"yaz0@sarc"`. Parsed into a
    /// [`crate::chain::TypeChain`] before any tool runs.
    #[serde(rename = "type")]
    pub type_descriptor: String,

    /// Digest of the untouched source file, checked before any
    /// transformation runs.
    #[serde(rename = "initialHash")]
    pub initial_hash: Digest,

    /// Expected output of the final pipeline stage.
    #[serde(rename = "finalHash")]
    pub final_hash: ExpectedHash,
}

/// Load the manifest from a JSON file.
pub fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>, ManifestError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_final_hash_parses_as_single() {
        let json = r#"{
            "path": "code/app.rpx",
            "type": "rpx",
            "initialHash": "aa11",
            "finalHash": "bb22"
        }"#;
        let entry: ManifestEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.type_descriptor, "rpx");
        assert!(matches!(entry.final_hash, ExpectedHash::Single(ref d) if d.as_str() == "bb22"));
    }

    #[test]
    fn list_final_hash_parses_as_per_member_in_order() {
        let json = r#"{
            "path": "content/stage.szs",
            "type": "yaz0@sarc",
            "initialHash": "aa11",
            "finalHash": [
                {"filename": "stage.sarc", "hash": "cc33"},
                {"filename": "room0.bin", "hash": "dd44"}
            ]
        }"#;
        let entry: ManifestEntry = serde_json::from_str(json).unwrap();
        let ExpectedHash::PerMember(members) = &entry.final_hash else {
            panic!("expected per-member list");
        };
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].filename, "stage.sarc");
        assert_eq!(entry.final_hash.first_member().unwrap().hash.as_str(), "cc33");
    }

    #[test]
    fn manifest_is_an_ordered_array() {
        let json = r#"[
            {"path": "a.bin", "type": "yaz0", "initialHash": "01", "finalHash": "02"},
            {"path": "b.bin", "type": "yaz0", "initialHash": "03", "finalHash": "04"}
        ]"#;
        let entries: Vec<ManifestEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].path, "a.bin");
        assert_eq!(entries[1].path, "b.bin");
    }

    #[test]
    fn load_reports_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        file.write_all(b"{ not json").unwrap();
        let err = load_manifest(file.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Json(_)));
    }
}
