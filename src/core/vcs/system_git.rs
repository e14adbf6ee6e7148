//! System git backend
//!
//! Only what a cycle needs from the checkout: the revision being released.
//! Subprocesses run with an isolated environment.

use crate::core::error::{CycleResult, GitError, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  pub fn open(path: &Path) -> CycleResult<Self> {
    let git = Self {
      repo_path: path.to_path_buf(),
    };
    let output = git
      .git_cmd()
      .args(["rev-parse", "--git-dir"])
      .output()
      .with_context(|| format!("Failed to execute git rev-parse in {}", path.display()))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(
          GitError::RepoNotFound {
            path: path.to_path_buf(),
          }
          .into(),
        );
      }
      return Err(
        GitError::CommandFailed {
          command: "git rev-parse --git-dir".to_string(),
          stderr: stderr.to_string(),
        }
        .into(),
      );
    }

    Ok(git)
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> CycleResult<String> {
    let output = self
      .git_cmd()
      .args(["rev-parse", "HEAD"])
      .output()
      .context("Failed to get HEAD commit")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(
        GitError::CommandFailed {
          command: "git rev-parse HEAD".to_string(),
          stderr: stderr.to_string(),
        }
        .into(),
      );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("advice.detachedHead=false");

    cmd
  }
}
