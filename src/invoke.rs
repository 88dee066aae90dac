//! Bounded-wait external tool invocation
//!
//! Every external executable the harness drives goes through one
//! primitive: spawn with a fixed argument list, capture stdout, and wait
//! with a configurable deadline. A tool that outruns the deadline is
//! killed and surfaced as a timeout failure rather than hanging the run.
//!
//! Stdout is the only captured stream; for the container tool it is the
//! authoritative list of produced member files. Stderr passes through to
//! the operator's terminal.

use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Default deadline for a single tool invocation.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 600;

/// Poll interval while waiting on a child process.
const WAIT_POLL: Duration = Duration::from_millis(25);

/// Errors from the invocation layer itself.
///
/// A tool that runs to completion with a non-zero exit code is NOT an
/// error here; callers inspect [`ToolResult::success`] and decide what the
/// exit code means for their format.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{tool} executable not found in {}", .dir.display())]
    NotFound { tool: String, dir: PathBuf },

    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("IO error while waiting on tool: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of a completed tool invocation. Ephemeral; consumed immediately
/// by the calling handler.
#[derive(Debug)]
pub struct ToolResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
}

impl ToolResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout as trimmed, non-empty lines. Carriage returns from tools
    /// built for Windows are stripped.
    pub fn stdout_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.stdout)
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Runs external tools resolved from a tool directory.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    tool_dir: PathBuf,
    timeout: Duration,
}

impl ToolRunner {
    pub fn new(tool_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            tool_dir: tool_dir.into(),
            timeout,
        }
    }

    pub fn tool_dir(&self) -> &Path {
        &self.tool_dir
    }

    /// Resolve a tool name to an executable path.
    ///
    /// Tries `<tool_dir>/<name>` then `<tool_dir>/<name>.exe`, matching the
    /// layout test binaries are shipped in.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, ToolError> {
        let bare = self.tool_dir.join(name);
        if bare.is_file() {
            return Ok(bare);
        }
        let exe = self.tool_dir.join(format!("{name}.exe"));
        if exe.is_file() {
            return Ok(exe);
        }
        Err(ToolError::NotFound {
            tool: name.to_string(),
            dir: self.tool_dir.clone(),
        })
    }

    /// Run a tool resolved by name from the tool directory.
    pub fn run<S: AsRef<OsStr>>(&self, name: &str, args: &[S]) -> Result<ToolResult, ToolError> {
        let exe = self.resolve(name)?;
        self.run_exe(&exe, args)
    }

    /// Run an explicitly located executable.
    pub fn run_exe<S: AsRef<OsStr>>(&self, exe: &Path, args: &[S]) -> Result<ToolResult, ToolError> {
        let tool = exe
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| exe.display().to_string());

        if !exe.is_file() {
            return Err(ToolError::NotFound {
                tool,
                dir: exe.parent().unwrap_or(Path::new(".")).to_path_buf(),
            });
        }

        let mut child = Command::new(exe)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        // Drain stdout on a helper thread so a chatty tool can't fill the
        // pipe and deadlock against our wait loop.
        let mut stdout_pipe = child.stdout.take().expect("stdout was piped");
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout_pipe.read_to_end(&mut buf);
            buf
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        let _ = reader.join();
                        return Err(ToolError::Timeout {
                            tool,
                            seconds: self.timeout.as_secs(),
                        });
                    }
                    thread::sleep(WAIT_POLL);
                }
            }
        };

        let stdout = reader.join().unwrap_or_default();
        Ok(ToolResult {
            exit_code: status.code().unwrap_or(-1),
            stdout,
        })
    }
}
