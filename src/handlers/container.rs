//! Container handler (archive pack/unpack)
//!
//! Unpack: `tool -u <workdir> <source>`. The tool's stdout, one produced
//! filename per line, is the authoritative record of what was unpacked; a
//! directory listing would misattribute pre-existing unrelated files in
//! the work directory.
//!
//! Manifest-mode validation is symmetric: a produced member missing from
//! the expected map fails, a digest mismatch fails, and an expected member
//! the tool never produced also fails.

use std::collections::{BTreeMap, HashSet};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::StageContext;
use crate::digest;
use crate::failure::VerifyFailure;
use crate::manifest::ExpectedHash;

/// Unpack `source` into the work directory and return the produced member
/// paths, tracked for cleanup, in the order the tool reported them.
pub fn unpack(ctx: &mut StageContext<'_>, source: &Path) -> Result<Vec<PathBuf>, VerifyFailure> {
    let result = ctx.runner.run(
        &ctx.tools.container,
        &[
            OsStr::new("-u"),
            ctx.workspace.root().as_os_str(),
            source.as_os_str(),
        ],
    )?;
    if !result.success() {
        return Err(VerifyFailure::UnpackFailed(source.to_path_buf()));
    }

    let mut members = Vec::new();
    for name in result.stdout_lines() {
        let path = ctx.workspace.join(&name);
        members.push(ctx.workspace.track(path));
    }
    Ok(members)
}

/// Repack `members` into `dest`: `tool -p <dest> <member>...`.
pub fn pack(
    ctx: &mut StageContext<'_>,
    dest: &Path,
    members: &[PathBuf],
) -> Result<(), VerifyFailure> {
    let mut args: Vec<&OsStr> = vec![OsStr::new("-p"), dest.as_os_str()];
    args.extend(members.iter().map(|m| m.as_os_str()));

    let result = ctx.runner.run(&ctx.tools.container, &args)?;
    ctx.workspace.track(dest.to_path_buf());
    if !result.success() {
        return Err(VerifyFailure::RepackFailed(dest.to_path_buf()));
    }
    Ok(())
}

/// Unpack `source` and reconcile every produced member against the
/// expected filename/digest table. Terminal stage; produces no artifact
/// for further stages.
///
/// `chained` is true when a preceding stage produced and already verified
/// `source`. In that case the first expected member is the source archive
/// itself and the unpack tool will not re-emit it.
pub fn run(
    ctx: &mut StageContext<'_>,
    source: &Path,
    expected: &ExpectedHash,
    chained: bool,
) -> Result<(), VerifyFailure> {
    let ExpectedHash::PerMember(members) = expected else {
        return Err(VerifyFailure::ExpectationShape {
            tag: "sarc",
            expected: "a member list",
        });
    };
    let expected_map: BTreeMap<&str, &crate::digest::Digest> = members
        .iter()
        .map(|m| (m.filename.as_str(), &m.hash))
        .collect();

    let produced = unpack(ctx, source)?;
    let mut seen: HashSet<String> = HashSet::new();

    for path in &produced {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Some(want) = expected_map.get(filename.as_str()) else {
            return Err(VerifyFailure::UnexpectedMember(filename));
        };
        let actual = digest::hash_file(path)?;
        if actual != **want {
            return Err(VerifyFailure::HashMismatch {
                path: path.clone(),
                expected: want.to_string(),
                actual: actual.to_string(),
            });
        }
        seen.insert(filename);
    }

    for member in members.iter().skip(if chained { 1 } else { 0 }) {
        if !seen.contains(member.filename.as_str()) {
            return Err(VerifyFailure::MissingMember(member.filename.clone()));
        }
    }
    Ok(())
}
