//! Git process abstraction layer
//!
//! This module provides a trait-based abstraction over the subprocess
//! capability that all git interaction goes through. Resolution logic never
//! launches processes itself; it talks to an injected [ProcessRunner], which
//! makes every git-dependent code path scriptable in tests.
//!
//! The concrete implementations are:
//!
//! - [process::SystemProcessRunner]: runs the system `git` binary
//! - [mock::ScriptedRunner]: a scripted implementation for testing
//!
//! [tags::TagSource] builds the tag command surface (fetch, sorted listing,
//! remote-only listing) on top of the runner.

pub mod mock;
pub mod process;
pub mod tags;

pub use mock::ScriptedRunner;
pub use process::SystemProcessRunner;
pub use tags::TagSource;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Captured outcome of one subprocess invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// A successful invocation with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        ProcessOutput {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed invocation with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        ProcessOutput {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Injected subprocess-execution capability
///
/// The single external responsibility is running a command and capturing its
/// exit status and output; exit codes are never interpreted beyond
/// success/failure. Implementations may block indefinitely; there is no
/// timeout layer.
pub trait ProcessRunner {
    /// Run `args[0]` with the remaining arguments, optionally in `cwd`.
    ///
    /// `Err` means the process could not be started at all; a started
    /// process that exits non-zero is an `Ok` with a failing status.
    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<ProcessOutput>;
}

/// Split multi-line subprocess stdout into trimmed, non-empty lines
pub fn split_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a usable git executable is reachable through the runner
pub fn git_available(runner: &dyn ProcessRunner) -> bool {
    matches!(runner.run(&["git", "--version"], None), Ok(output) if output.success())
}

/// Locate the working-copy root that contains `dir`, if any
pub fn discover_git_root(runner: &dyn ProcessRunner, dir: &Path) -> Option<PathBuf> {
    let output = runner
        .run(&["git", "rev-parse", "--absolute-git-dir"], Some(dir))
        .ok()?;
    if !output.success() {
        return None;
    }
    PathBuf::from(output.stdout.trim())
        .parent()
        .map(Path::to_path_buf)
}

/// Current HEAD commit hash as seen from `dir`, if it is inside a checkout
pub fn head_commit(runner: &dyn ProcessRunner, dir: &Path) -> Option<String> {
    let output = runner
        .run(&["git", "log", "-n1", "--pretty=%H"], Some(dir))
        .ok()?;
    if !output.success() {
        return None;
    }
    let commit = output.stdout.trim().to_string();
    if commit.is_empty() {
        None
    } else {
        Some(commit)
    }
}
