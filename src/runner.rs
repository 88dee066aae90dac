//! Manifest-driven verification runs
//!
//! Iterates the hashes manifest in order, dispatching each entry's type
//! chain and aggregating pass/fail. The trusted-root policy, when
//! configured, gates the whole run: a tampered root image means none of
//! the recorded baselines can be trusted, so nothing is attempted.

use std::path::{Path, PathBuf};

use crate::chain::{self, TypeChain};
use crate::config::{ToolNames, TrustedRootPolicy};
use crate::digest;
use crate::failure::VerifyFailure;
use crate::handlers::StageContext;
use crate::invoke::ToolRunner;
use crate::manifest::ManifestEntry;
use crate::workspace::Workspace;

/// Batch-level failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Stop at the first failing entry.
    AbortOnFailure,
    /// Attempt every entry; report all failures at the end.
    KeepGoing,
}

/// Options for one manifest run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Delete each entry's artifacts after it completes. Off by default so
    /// a failing entry's partial artifacts stay on disk for inspection.
    pub cleanup: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::AbortOnFailure,
            cleanup: false,
        }
    }
}

/// One failing entry and its cause.
#[derive(Debug)]
pub struct EntryFailure {
    pub path: String,
    pub failure: VerifyFailure,
}

/// Aggregate result of a manifest run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub passed: usize,
    pub failures: Vec<EntryFailure>,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives a whole manifest against the external tools.
pub struct ManifestRunner<'a> {
    tool_runner: &'a ToolRunner,
    tools: &'a ToolNames,
    game_root: &'a Path,
}

impl<'a> ManifestRunner<'a> {
    pub fn new(tool_runner: &'a ToolRunner, tools: &'a ToolNames, game_root: &'a Path) -> Self {
        Self {
            tool_runner,
            tools,
            game_root,
        }
    }

    /// Verify the trusted-root policy before anything else runs.
    pub fn check_trusted_root(&self, policy: &TrustedRootPolicy) -> Result<(), VerifyFailure> {
        let root_path = self.game_root.join(&policy.path);
        if !root_path.is_file() {
            return Err(VerifyFailure::MissingSource(root_path));
        }
        let actual = digest::hash_file(&root_path)?;
        if actual != policy.sha256 {
            return Err(VerifyFailure::UntrustedRoot(root_path));
        }
        Ok(())
    }

    /// Run every manifest entry, in order.
    ///
    /// Returns `Err` only for run-fatal conditions (missing game root, a
    /// failed trusted-root pre-flight, an uncreatable work directory);
    /// per-entry failures land in the summary. Progress is reported as it
    /// happens, one line per entry.
    pub fn run(
        &self,
        entries: &[ManifestEntry],
        work_dir: &Path,
        policy: Option<&TrustedRootPolicy>,
        options: &RunOptions,
    ) -> Result<RunSummary, VerifyFailure> {
        if !self.game_root.is_dir() {
            return Err(VerifyFailure::MissingSource(self.game_root.to_path_buf()));
        }
        if let Some(policy) = policy {
            self.check_trusted_root(policy)?;
        }

        let mut summary = RunSummary::default();
        for entry in entries {
            let mut workspace = Workspace::create(work_dir)?;
            let result = self.run_entry(entry, &mut workspace);
            if options.cleanup {
                workspace.clean();
            }
            match result {
                Ok(()) => {
                    println!("Success for entry {}", entry.path);
                    summary.passed += 1;
                }
                Err(failure) => {
                    eprintln!("{}: {}", entry.path, failure);
                    summary.failures.push(EntryFailure {
                        path: entry.path.clone(),
                        failure,
                    });
                    if options.mode == RunMode::AbortOnFailure {
                        break;
                    }
                }
            }
        }
        Ok(summary)
    }

    fn run_entry(
        &self,
        entry: &ManifestEntry,
        workspace: &mut Workspace,
    ) -> Result<(), VerifyFailure> {
        let chain = TypeChain::parse(&entry.type_descriptor)?;
        let source: PathBuf = self.game_root.join(&entry.path);
        let mut ctx = StageContext {
            runner: self.tool_runner,
            tools: self.tools,
            workspace,
        };
        chain::run_chain(
            &mut ctx,
            &source,
            &chain,
            &entry.initial_hash,
            &entry.final_hash,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;
    use crate::manifest::ExpectedHash;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    fn write_script(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
    }

    fn entry(path: &str, descriptor: &str, initial: &[u8], fin: &[u8]) -> ManifestEntry {
        ManifestEntry {
            path: path.to_string(),
            type_descriptor: descriptor.to_string(),
            initial_hash: digest::hash_bytes(initial),
            final_hash: ExpectedHash::Single(digest::hash_bytes(fin)),
        }
    }

    #[test]
    fn unknown_tag_fails_the_entry_without_spawning_anything() {
        let dir = tempfile::tempdir().unwrap();
        let game = dir.path().join("game");
        fs::create_dir(&game).unwrap();
        fs::write(game.join("a.bin"), b"bytes").unwrap();

        // Tool dir is empty; a spawn attempt would surface ToolNotFound,
        // not UnknownTag.
        let tool_runner = ToolRunner::new(dir.path().join("tools"), Duration::from_secs(5));
        let tools = ToolNames::default();
        let runner = ManifestRunner::new(&tool_runner, &tools, &game);

        let entries = vec![entry("a.bin", "zzz", b"bytes", b"bytes")];
        let summary = runner
            .run(
                &entries,
                &dir.path().join("work"),
                None,
                &RunOptions::default(),
            )
            .unwrap();
        assert_eq!(summary.passed, 0);
        assert!(matches!(
            summary.failures[0].failure,
            VerifyFailure::UnknownTag(_)
        ));
    }

    #[test]
    fn trusted_root_mismatch_is_run_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let game = dir.path().join("game");
        fs::create_dir_all(game.join("code")).unwrap();
        fs::write(game.join("code/app.rpx"), b"modified image").unwrap();

        let tool_runner = ToolRunner::new(dir.path(), Duration::from_secs(5));
        let tools = ToolNames::default();
        let runner = ManifestRunner::new(&tool_runner, &tools, &game);

        let policy = TrustedRootPolicy {
            path: "code/app.rpx".to_string(),
            sha256: Digest::from_hex("00"),
        };
        let err = runner
            .run(
                &[],
                &dir.path().join("work"),
                Some(&policy),
                &RunOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, VerifyFailure::UntrustedRoot(_)));
    }

    #[test]
    fn keep_going_attempts_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let game = dir.path().join("game");
        fs::create_dir(&game).unwrap();
        fs::write(game.join("good.szs"), b"bytes").unwrap();
        fs::write(game.join("bad.szs"), b"tampered").unwrap();

        let tools_dir = dir.path().join("tools");
        fs::create_dir(&tools_dir).unwrap();
        write_script(&tools_dir, "yaz0test", "cp \"$2\" \"$3\"");

        let tool_runner = ToolRunner::new(&tools_dir, Duration::from_secs(5));
        let tools = ToolNames::default();
        let runner = ManifestRunner::new(&tool_runner, &tools, &game);

        let entries = vec![
            entry("bad.szs", "yaz0", b"pristine", b"pristine"),
            entry("good.szs", "yaz0", b"bytes", b"bytes"),
        ];

        let aborted = runner
            .run(
                &entries,
                &dir.path().join("work"),
                None,
                &RunOptions::default(),
            )
            .unwrap();
        assert_eq!(aborted.passed, 0);
        assert_eq!(aborted.failures.len(), 1);

        let kept_going = runner
            .run(
                &entries,
                &dir.path().join("work"),
                None,
                &RunOptions {
                    mode: RunMode::KeepGoing,
                    cleanup: true,
                },
            )
            .unwrap();
        assert_eq!(kept_going.passed, 1);
        assert_eq!(kept_going.failures.len(), 1);
    }
}
