//! Test helpers for integration tests

#![allow(dead_code)]

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const REVISION: &str = "9fceb02d0ae598e95dc970b74767f19372d61af8";

pub const T1: &str = "Mon, 14 Apr 2025 02:00:51 +0000";
pub const T2: &str = "Tue, 15 Apr 2025 02:01:33 +0000";
pub const T3: &str = "Wed, 16 Apr 2025 02:00:07 +0000";

/// Producer that writes all outputs plus the title staged in `next_title`
pub const SUCCESS_PRODUCER: &str = r#"printf '%s\n' "$1" >> seen_since
printf 'categories-bytes' > categories
printf 'keywords-bytes' > keywords
printf 'dump-bytes' > dump
cp next_title last_updated
exit 0"#;

const LOCAL_CONFIG: &str = r#"
[producer]
program = "./producer.sh"

[store]
kind = "local"
path = "releases"
"#;

/// A scratch work directory with a local store and a scripted producer
pub struct TestWorkdir {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkdir {
  /// Work directory configured for the local store, producer not yet written
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    std::fs::write(path.join("cycle.toml"), LOCAL_CONFIG)?;
    Ok(Self { _root: root, path })
  }

  /// Work directory whose producer always succeeds
  pub fn with_success_producer() -> Result<Self> {
    let ws = Self::new()?;
    ws.set_producer(SUCCESS_PRODUCER)?;
    Ok(ws)
  }

  /// Replace the producer script body
  pub fn set_producer(&self, body: &str) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let script = self.path.join("producer.sh");
    std::fs::write(&script, format!("#!/bin/sh\n{}\n", body))?;
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
  }

  /// Stage the title the success producer will write next
  pub fn stage_title(&self, title: &str) -> Result<()> {
    std::fs::write(self.path.join("next_title"), format!("{}\n", title))?;
    Ok(())
  }

  /// Run the CLI in this work directory
  pub fn run(&self, args: &[&str]) -> Result<Output> {
    run_release_cycle(&self.path, args)
  }

  /// Run a full cycle with the given run id, asserting success
  pub fn cycle(&self, title: &str, run_id: &str) -> Result<Output> {
    self.stage_title(title)?;
    let output = self.run(&["run", "--run-id", run_id, "--revision", REVISION])?;
    if !output.status.success() {
      anyhow::bail!(
        "cycle failed\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
      );
    }
    Ok(output)
  }

  /// Releases in the local store manifest
  pub fn releases(&self) -> Result<Vec<Value>> {
    let manifest = self.path.join("releases").join("releases.json");
    if !manifest.exists() {
      return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(&manifest)?;
    Ok(serde_json::from_str(&content)?)
  }

  /// Release titles currently stored, sorted
  pub fn release_titles(&self) -> Result<Vec<String>> {
    let mut titles: Vec<String> = self
      .releases()?
      .iter()
      .filter_map(|r| r["title"].as_str().map(String::from))
      .collect();
    titles.sort();
    Ok(titles)
  }

  /// Release tags currently stored, sorted
  pub fn release_tags(&self) -> Result<Vec<String>> {
    let mut tags: Vec<String> = self
      .releases()?
      .iter()
      .filter_map(|r| r["tag"].as_str().map(String::from))
      .collect();
    tags.sort();
    Ok(tags)
  }

  /// Timestamps the producer was invoked with, in order
  pub fn seen_since(&self) -> Result<Vec<String>> {
    let path = self.path.join("seen_since");
    if !path.exists() {
      return Ok(Vec::new());
    }
    Ok(std::fs::read_to_string(path)?.lines().map(String::from).collect())
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }
}

/// Run the release-cycle binary with a clean CI environment
pub fn run_release_cycle(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_release-cycle");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("GH_TOKEN")
    .env_remove("GITHUB_RUN_ID")
    .env_remove("GITHUB_SHA")
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run release-cycle")
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
