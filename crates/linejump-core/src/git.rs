//! Git integration for fetching diff text

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository")]
    NotARepo,
    #[error("Git command failed: {0}")]
    CommandFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What to diff: `from` against `to`, or against the working tree when `to`
/// is `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRequest {
    pub file: PathBuf,
    pub from: String,
    pub to: Option<String>,
    pub ignore_whitespace: bool,
}

impl DiffRequest {
    pub fn new(file: impl Into<PathBuf>, from: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            from: from.into(),
            to: None,
            ignore_whitespace: false,
        }
    }

    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn ignore_whitespace(mut self, enabled: bool) -> Self {
        self.ignore_whitespace = enabled;
        self
    }

    /// Arguments after `git -C <repo>`
    fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "diff".into(),
            "--no-color".into(),
            "--no-ext-diff".into(),
            "-M".into(),
        ];
        if self.ignore_whitespace {
            args.push("-w".into());
        }
        args.push(self.from.clone().into());
        if let Some(to) = &self.to {
            args.push(to.clone().into());
        }
        args.push("--".into());
        args.push(self.file.clone().into_os_string());
        args
    }
}

/// Get the root of the git repository
pub fn repo_root(path: &Path) -> Result<PathBuf, GitError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(path)
        .arg("rev-parse")
        .arg("--show-toplevel")
        .output()?;

    if !output.status.success() {
        return Err(GitError::NotARepo);
    }

    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(PathBuf::from(root))
}

/// Unified diff text for one file between two revisions.
///
/// Empty output means the file is unchanged between them.
pub fn fetch_diff(repo_path: &Path, request: &DiffRequest) -> Result<String, GitError> {
    let args = request.args();
    tracing::debug!(repo = %repo_path.display(), ?args, "running git diff");

    let output = Command::new("git")
        .arg("-C")
        .arg(repo_path)
        .args(&args)
        .output()?;

    if !output.status.success() {
        return Err(GitError::CommandFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
