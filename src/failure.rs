//! Failure taxonomy for verification runs
//!
//! Every failure surfaces as a single human-readable line identifying the
//! offending asset and cause. Failures are recoverable at entry/file
//! granularity: a failing entry never corrupts the state of other entries,
//! since each operates on its own artifacts. Nothing is retried.

use std::io;
use std::path::PathBuf;

use crate::invoke::ToolError;

/// Broad class of a failure, for reporting and triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Missing tool executable, missing source file, uncreatable directory.
    Environment,
    /// External tool exited non-zero, failed to spawn, or timed out.
    Process,
    /// Digest mismatch between actual and expected content.
    Integrity,
    /// Unrecognized type tag or malformed expectation shape.
    Schema,
}

/// A single verification failure.
///
/// Display strings are the exact lines reported to the operator, one per
/// failing entry or file.
#[derive(Debug, thiserror::Error)]
pub enum VerifyFailure {
    #[error("{tool} executable not found in {}", .dir.display())]
    ToolNotFound { tool: String, dir: PathBuf },

    #[error("source file missing: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("workspace error: {0}")]
    Workspace(#[from] io::Error),

    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} timed out after {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },

    #[error("unable to extract file {}", .0.display())]
    ExtractFailed(PathBuf),

    #[error("unable to decode file {}", .0.display())]
    DecodeFailed(PathBuf),

    #[error("unable to unpack archive {}", .0.display())]
    UnpackFailed(PathBuf),

    #[error("unable to repack archive {}", .0.display())]
    RepackFailed(PathBuf),

    #[error("failed on {step} step for {}", .path.display())]
    CodecStepFailed { step: CodecStep, path: PathBuf },

    #[error("file {} got a hash mismatch (expected {expected}, got {actual})", .path.display())]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("round-trip mismatch for {}: redecoded bytes differ from first decode", .0.display())]
    RoundTripMismatch(PathBuf),

    #[error("file {0} was produced but not expected")]
    UnexpectedMember(String),

    #[error("file {0} was expected but not produced")]
    MissingMember(String),

    #[error("trusted root {} does not match the expected digest; image may already be modified", .0.display())]
    UntrustedRoot(PathBuf),

    #[error("unknown entry type {0}")]
    UnknownTag(String),

    #[error("expected {expected} final hash for {tag} type")]
    ExpectationShape {
        tag: &'static str,
        expected: &'static str,
    },
}

/// Steps of the codec round-trip protocol, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecStep {
    Decode,
    Reencode,
    Redecode,
}

impl std::fmt::Display for CodecStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CodecStep::Decode => "decode",
            CodecStep::Reencode => "re-encode",
            CodecStep::Redecode => "re-decode",
        })
    }
}

impl VerifyFailure {
    /// The taxonomy class this failure belongs to.
    pub fn class(&self) -> FailureClass {
        match self {
            VerifyFailure::ToolNotFound { .. }
            | VerifyFailure::MissingSource(_)
            | VerifyFailure::Workspace(_) => FailureClass::Environment,

            VerifyFailure::Spawn { .. }
            | VerifyFailure::ToolTimeout { .. }
            | VerifyFailure::ExtractFailed(_)
            | VerifyFailure::DecodeFailed(_)
            | VerifyFailure::UnpackFailed(_)
            | VerifyFailure::RepackFailed(_)
            | VerifyFailure::CodecStepFailed { .. } => FailureClass::Process,

            VerifyFailure::HashMismatch { .. }
            | VerifyFailure::RoundTripMismatch(_)
            | VerifyFailure::UnexpectedMember(_)
            | VerifyFailure::MissingMember(_)
            | VerifyFailure::UntrustedRoot(_) => FailureClass::Integrity,

            VerifyFailure::UnknownTag(_) | VerifyFailure::ExpectationShape { .. } => {
                FailureClass::Schema
            }
        }
    }
}

impl From<ToolError> for VerifyFailure {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound { tool, dir } => VerifyFailure::ToolNotFound { tool, dir },
            ToolError::Spawn { tool, source } => VerifyFailure::Spawn { tool, source },
            ToolError::Timeout { tool, seconds } => VerifyFailure::ToolTimeout { tool, seconds },
            ToolError::Io(err) => VerifyFailure::Workspace(err),
        }
    }
}
