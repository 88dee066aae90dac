//! Extraction handler (compiled binary to linked image)
//!
//! Drives the executable extractor: `tool -d <source> <source>.elf`. The
//! destination lands next to the source, matching the extractor's own
//! convention, and is tracked for cleanup like any other artifact.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::StageContext;
use crate::digest;
use crate::failure::VerifyFailure;
use crate::manifest::ExpectedHash;

const DEST_SUFFIX: &str = ".elf";

/// Extract `source` and verify the output digest. Returns the extracted
/// artifact for any later stage, though in practice this stage is terminal.
pub fn run(
    ctx: &mut StageContext<'_>,
    source: &Path,
    expected: &ExpectedHash,
) -> Result<PathBuf, VerifyFailure> {
    let ExpectedHash::Single(want) = expected else {
        return Err(VerifyFailure::ExpectationShape {
            tag: "rpx",
            expected: "a single digest",
        });
    };

    let mut dest = source.as_os_str().to_os_string();
    dest.push(DEST_SUFFIX);
    let dest = PathBuf::from(dest);

    let result = ctx.runner.run(
        &ctx.tools.extract,
        &[OsStr::new("-d"), source.as_os_str(), dest.as_os_str()],
    )?;
    if !result.success() {
        return Err(VerifyFailure::ExtractFailed(source.to_path_buf()));
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
