//! Compound type chains and the stage dispatcher
//!
//! An entry's `type` field is a delimiter-joined descriptor such as
//! `"yaz0@sarc"`: an ordered list of format tags, outer transformation
//! first. Tags are matched case-insensitively and by prefix, and resolve
//! to a closed set of variants at parse time; an unknown tag fails the
//! entry before any external process is spawned.

use std::path::{Path, PathBuf};

use crate::digest::{self, Digest};
use crate::failure::VerifyFailure;
use crate::handlers::{codec, container, extract, StageContext};
use crate::manifest::ExpectedHash;

/// Delimiter between tags in a compound descriptor.
const TAG_DELIMITER: char = '@';

/// The closed set of supported format transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    /// Executable extraction (rpx*).
    Extract,
    /// Compression codec (yaz0*).
    Codec,
    /// Archive pack/unpack (sarc*).
    Container,
}

impl FormatTag {
    /// Match a single tag, case-insensitive, by prefix.
    pub fn parse(tag: &str) -> Result<Self, VerifyFailure> {
        let normalized = tag.trim().to_ascii_lowercase();
        if normalized.starts_with("rpx") {
            Ok(FormatTag::Extract)
        } else if normalized.starts_with("yaz0") {
            Ok(FormatTag::Codec)
        } else if normalized.starts_with("sarc") {
            Ok(FormatTag::Container)
        } else {
            Err(VerifyFailure::UnknownTag(tag.trim().to_string()))
        }
    }
}

/// An ordered sequence of format tags; the pipeline order for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeChain(Vec<FormatTag>);

impl TypeChain {
    /// Parse a compound descriptor such as `"yaz0@sarc"`.
    pub fn parse(descriptor: &str) -> Result<Self, VerifyFailure> {
        let tags = descriptor
            .split(TAG_DELIMITER)
            .map(FormatTag::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TypeChain(tags))
    }

    pub fn tags(&self) -> &[FormatTag] {
        &self.0
    }
}

/// Run one entry's full pipeline.
///
/// The source file is first checked against `initial` as a pre-flight
/// authenticity gate, then each stage's output artifact becomes the next
/// stage's input path. The first failing stage aborts the chain; no
/// further stages run.
pub fn run_chain(
    ctx: &mut StageContext<'_>,
    source: &Path,
    chain: &TypeChain,
    initial: &Digest,
    expected: &ExpectedHash,
) -> Result<(), VerifyFailure> {
    if !source.is_file() {
        return Err(VerifyFailure::MissingSource(source.to_path_buf()));
    }
    let actual = digest::hash_file(source)?;
    if actual != *initial {
        return Err(VerifyFailure::HashMismatch {
            path: source.to_path_buf(),
            expected: initial.to_string(),
            actual: actual.to_string(),
        });
    }

    let mut current: PathBuf = source.to_path_buf();
    // Becomes true once a stage replaces the source with its own verified
    // artifact; the container stage must know not to expect that artifact
    // back from the unpack tool.
    let mut chained = false;
    for tag in chain.tags() {
        match tag {
            FormatTag::Extract => {
                current = extract::run(ctx, &current, expected)?;
                chained = true;
            }
            FormatTag::Codec => {
                current = codec::run(ctx, &current, expected)?;
                chained = true;
            }
            FormatTag::Container => {
                container::run(ctx, &current, expected, chained)?;
            }
        }
    }
    Ok(())
}
