//! Round-trip verification
//!
//! Confirms invertibility without any externally recorded baseline:
//!
//! - codec: `decode(x)` must be bit-identical to `decode(encode(decode(x)))`
//! - container: unpacking an archive and packing the produced members back
//!   must reproduce a byte-identical archive
//!
//! Both protocols run over a single file or a batch (explicit list or an
//! enumerated directory). Codec batches stop at the first failure; archive
//! batches continue past individual failures and report every outcome.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ToolNames;
use crate::digest;
use crate::failure::{CodecStep, VerifyFailure};
use crate::handlers::{container, StageContext};
use crate::invoke::ToolRunner;
use crate::workspace::Workspace;

/// Input to a batch verification.
#[derive(Debug, Clone)]
pub enum BatchInput {
    /// An explicit list of files, verified in order.
    Files(Vec<PathBuf>),
    /// Every regular file in a directory, in name order.
    Directory(PathBuf),
}

/// Options shared by both round-trip protocols.
#[derive(Debug, Clone)]
pub struct RoundTripOptions {
    /// Only verify files with this extension when enumerating a directory.
    pub extension_filter: Option<String>,
    /// Delete intermediate artifacts when a file's verification completes.
    /// Disable to keep them on disk for inspection.
    pub cleanup_on_exit: bool,
}

impl Default for RoundTripOptions {
    fn default() -> Self {
        Self {
            extension_filter: None,
            cleanup_on_exit: true,
        }
    }
}

/// A batch failure naming the offending file.
#[derive(Debug)]
pub struct BatchFailure {
    pub file: PathBuf,
    pub failure: VerifyFailure,
}

/// Outcome of one file in a continue-on-failure batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub file: PathBuf,
    pub result: Result<(), VerifyFailure>,
}

/// Drives the round-trip protocols against one external tool executable.
#[derive(Debug)]
pub struct RoundTripVerifier {
    timeout: Duration,
    options: RoundTripOptions,
}

impl RoundTripVerifier {
    pub fn new(timeout: Duration, options: RoundTripOptions) -> Self {
        Self { timeout, options }
    }

    /// Codec self-test for a single file: decode, re-encode, re-decode,
    /// then require the two decodes to match exactly. Intermediates are
    /// tracked in `workspace`; cleanup is the caller's call via
    /// [`RoundTripOptions::cleanup_on_exit`].
    pub fn verify_codec_file(
        &self,
        tool: &Path,
        input: &Path,
        workspace: &mut Workspace,
    ) -> Result<(), VerifyFailure> {
        let runner = self.runner_for(tool);
        let base = file_name(input);

        let first_decode = workspace.track(workspace.join(&format!("{base}.dec")));
        let step = |step, dest: &Path, src: &Path| -> Result<(), VerifyFailure> {
            let flag = if step == CodecStep::Reencode { "-e" } else { "-d" };
            let result = runner.run_exe(
                tool,
                &[OsStr::new(flag), src.as_os_str(), dest.as_os_str()],
            )?;
            if !result.success() {
                return Err(VerifyFailure::CodecStepFailed {
                    step,
                    path: input.to_path_buf(),
                });
            }
            Ok(())
        };

        step(CodecStep::Decode, &first_decode, input)?;

        let reencoded = workspace.track(PathBuf::from(append_ext(&first_decode, "enc")));
        step(CodecStep::Reencode, &reencoded, &first_decode)?;

        let redecoded = workspace.track(PathBuf::from(append_ext(&reencoded, "dec")));
        step(CodecStep::Redecode, &redecoded, &reencoded)?;

        let first = digest::hash_file(&first_decode)?;
        let second = digest::hash_file(&redecoded)?;
        if first != second {
            return Err(VerifyFailure::RoundTripMismatch(input.to_path_buf()));
        }
        Ok(())
    }

    /// Codec self-test over a batch. Stops at the first failing file and
    /// reports it. Returns the number of files that passed.
    pub fn run_codec_batch(
        &self,
        tool: &Path,
        input: BatchInput,
        out_dir: &Path,
    ) -> Result<usize, BatchFailure> {
        let label = input_label(&input, out_dir);
        let files = self.collect(input).map_err(|err| BatchFailure {
            file: label.clone(),
            failure: VerifyFailure::Workspace(err),
        })?;
        let mut workspace = Workspace::create(out_dir).map_err(|err| BatchFailure {
            file: out_dir.to_path_buf(),
            failure: VerifyFailure::Workspace(err),
        })?;

        let mut passed = 0;
        for file in files {
            let result = self.verify_codec_file(tool, &file, &mut workspace);
            if self.options.cleanup_on_exit {
                workspace.clean();
            }
            match result {
                Ok(()) => passed += 1,
                Err(failure) => return Err(BatchFailure { file, failure }),
            }
        }
        Ok(passed)
    }

    /// Repack round-trip for a single archive: unpack, pack the produced
    /// members, and require the repacked archive to be byte-identical to
    /// the original.
    pub fn verify_container_file(
        &self,
        tool: &Path,
        archive: &Path,
        workspace: &mut Workspace,
    ) -> Result<(), VerifyFailure> {
        let runner = self.runner_for(tool);
        let tools = ToolNames {
            container: file_name(tool),
            ..ToolNames::default()
        };
        let mut ctx = StageContext {
            runner: &runner,
            tools: &tools,
            workspace,
        };

        let members = container::unpack(&mut ctx, archive)?;
        let repacked = ctx.workspace.join(&format!("{}.check", file_name(archive)));
        container::pack(&mut ctx, &repacked, &members)?;

        let original = digest::hash_file(archive)?;
        let roundtripped = digest::hash_file(&repacked)?;
        if original != roundtripped {
            return Err(VerifyFailure::RoundTripMismatch(archive.to_path_buf()));
        }
        Ok(())
    }

    /// Repack round-trip over a batch. Every file is attempted; each
    /// outcome is reported.
    pub fn run_container_batch(
        &self,
        tool: &Path,
        input: BatchInput,
        work_dir: &Path,
    ) -> Vec<BatchOutcome> {
        let label = input_label(&input, work_dir);
        let files = match self.collect(input) {
            Ok(files) => files,
            Err(err) => {
                return vec![BatchOutcome {
                    file: label,
                    result: Err(VerifyFailure::Workspace(err)),
                }]
            }
        };

        let mut outcomes = Vec::new();
        for file in files {
            let result = Workspace::create(work_dir)
                .map_err(VerifyFailure::Workspace)
                .and_then(|mut workspace| {
                    let result = self.verify_container_file(tool, &file, &mut workspace);
                    if self.options.cleanup_on_exit {
                        workspace.clean();
                    }
                    result
                });
            outcomes.push(BatchOutcome { file, result });
        }
        outcomes
    }

    fn runner_for(&self, tool: &Path) -> ToolRunner {
        let dir = tool.parent().unwrap_or(Path::new("."));
        ToolRunner::new(dir, self.timeout)
    }

    fn collect(&self, input: BatchInput) -> io::Result<Vec<PathBuf>> {
        match input {
            BatchInput::Files(files) => Ok(files),
            BatchInput::Directory(dir) => {
                let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.is_file())
                    .filter(|path| self.matches_filter(path))
                    .collect();
                files.sort();
                Ok(files)
            }
        }
    }

    fn matches_filter(&self, path: &Path) -> bool {
        match &self.options.extension_filter {
            None => true,
            Some(wanted) => path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(wanted.trim_start_matches('.')))
                .unwrap_or(false),
        }
    }
}

/// Best path to blame when batch enumeration itself fails.
fn input_label(input: &BatchInput, fallback: &Path) -> PathBuf {
    match input {
        BatchInput::Directory(dir) => dir.clone(),
        BatchInput::Files(_) => fallback.to_path_buf(),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn append_ext(path: &Path, ext: &str) -> OsString {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    name
}
