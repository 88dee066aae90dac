//! assetcheck - round-trip verification for game-asset tools
//!
//! This crate is a correctness oracle for externally-built binary-format
//! tools (an executable extractor, a compression codec, a container
//! packer/unpacker). It round-trips real game-asset files through those
//! tools and compares SHA-256 digests against known-good expectations
//! recorded in a hashes manifest. The tools themselves are opaque
//! processes with a fixed argument contract; nothing here reimplements a
//! binary format.

pub mod chain;
pub mod config;
pub mod digest;
pub mod failure;
pub mod handlers;
pub mod invoke;
pub mod manifest;
pub mod roundtrip;
pub mod runner;
pub mod workspace;

pub use chain::{FormatTag, TypeChain};
pub use config::{HarnessConfig, ToolNames, TrustedRootPolicy};
pub use digest::Digest;
pub use failure::{FailureClass, VerifyFailure};
pub use invoke::{ToolResult, ToolRunner};
pub use manifest::{ExpectedHash, ManifestEntry, MemberHash};
pub use roundtrip::{BatchInput, RoundTripOptions, RoundTripVerifier};
pub use runner::{ManifestRunner, RunMode, RunOptions, RunSummary};
pub use workspace::Workspace;
