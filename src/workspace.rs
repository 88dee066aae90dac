//! Scratch workspace for intermediate artifacts
//!
//! The workspace owns every artifact produced while evaluating an entry
//! and is the sole authority for cleanup. Handlers register each path they
//! (or the external tool on their behalf) create; on completion the caller
//! either cleans the tracked set or leaves it on disk for inspection.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A working directory plus the set of files produced into (or alongside)
/// it during one verification.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    tracked: Vec<PathBuf>,
}

impl Workspace {
    /// Create (or reuse) the working directory at `root`.
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            tracked: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a named file inside the workspace. Does not create or track.
    pub fn join(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Register an artifact for eventual cleanup. Paths outside the root
    /// are allowed; some tools write next to their input.
    pub fn track(&mut self, path: PathBuf) -> PathBuf {
        self.tracked.push(path.clone());
        path
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }

    /// Delete every tracked artifact, best-effort. Returns the paths that
    /// could not be removed (already-gone files are not failures).
    pub fn clean(&mut self) -> Vec<PathBuf> {
        let mut stubborn = Vec::new();
        for path in self.tracked.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(_) => stubborn.push(path),
            }
        }
        stubborn
    }
}
