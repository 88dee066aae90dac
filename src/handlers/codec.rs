//! Codec handler (compress/decompress transformation)
//!
//! Manifest-mode decode: `tool -d <source> <dest>`. The destination name
//! depends on the expectation shape: a plain digest yields
//! `<basename>.dec` in the work directory, a per-member list uses the
//! first entry's declared filename so a following container stage receives
//! the concrete produced file rather than a guessed name.
//!
//! Known limitation, carried over from the recorded baselines: when this
//! handler terminates a chain with a list expectation, only the first list
//! entry is honored.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::StageContext;
use crate::digest;
use crate::failure::VerifyFailure;
use crate::manifest::ExpectedHash;

/// Decode `source` into the work directory and verify the output digest.
/// Returns the decoded artifact, which becomes the next stage's input.
pub fn run(
    ctx: &mut StageContext<'_>,
    source: &Path,
    expected: &ExpectedHash,
) -> Result<PathBuf, VerifyFailure> {
    let (out_name, want) = match expected {
        ExpectedHash::Single(digest) => {
            let base = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string());
            (format!("{base}.dec"), digest)
        }
        ExpectedHash::PerMember(members) => {
            let first = members.first().ok_or(VerifyFailure::ExpectationShape {
                tag: "yaz0",
                expected: "a non-empty member list",
            })?;
            (first.filename.clone(), &first.hash)
        }
    };

    let dest = ctx.workspace.join(&out_name);
    let result = ctx.runner.run(
        &ctx.tools.codec,
        &[OsStr::new("-d"), source.as_os_str(), dest.as_os_str()],
    )?;
    if !result.success() {
        return Err(VerifyFailure::DecodeFailed(source.to_path_buf()));
    }
    ctx.workspace.track(dest.clone());

    let actual = digest::hash_file(&dest)?;
    if actual != *want {
        return Err(VerifyFailure::HashMismatch {
            path: dest,
            expected: want.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(dest)
}
