//! GitHub release store via gh CLI
//!
//! Every call runs `gh` with a cleared environment. The token, when given, is
//! the only credential the subprocess sees and is scrubbed from anything we
//! report back.

use super::{NewRelease, ReleaseRecord, ReleaseStore, StoreResult};
use crate::core::error::StoreError;
use crate::core::secret::Secret;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Upper bound on releases fetched by `gh release list`
const LIST_LIMIT: &str = "1000";

/// Environment variables passed through to gh besides the token
const PASSTHROUGH_ENV: &[&str] = &["PATH", "HOME", "XDG_CONFIG_HOME", "GH_HOST", "SSL_CERT_FILE", "SSL_CERT_DIR"];

pub struct GithubStore {
  repo: Option<String>,
  token: Option<Secret>,
  workdir: PathBuf,
}

/// Shape of `gh release list/view --json tagName,name,publishedAt`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhRelease {
  tag_name: String,
  #[serde(default)]
  name: String,
  published_at: DateTime<Utc>,
}

impl From<GhRelease> for ReleaseRecord {
  fn from(r: GhRelease) -> Self {
    ReleaseRecord {
      tag: r.tag_name,
      title: r.name,
      published_at: r.published_at,
    }
  }
}

impl GithubStore {
  pub fn new(repo: Option<String>, token: Option<Secret>, workdir: &Path) -> Self {
    Self {
      repo,
      token,
      workdir: workdir.to_path_buf(),
    }
  }

  /// Build a gh command with isolated environment
  fn gh_cmd(&self) -> Command {
    let mut cmd = Command::new("gh");
    cmd.current_dir(&self.workdir);

    cmd.env_clear();
    for key in PASSTHROUGH_ENV {
      if let Ok(value) = std::env::var(key) {
        cmd.env(key, value);
      }
    }
    if let Some(token) = &self.token {
      cmd.env("GH_TOKEN", token.expose());
    }
    cmd.env("GH_PROMPT_DISABLED", "1");
    cmd.env("NO_COLOR", "1");

    cmd
  }

  fn repo_args(&self) -> Vec<&str> {
    match &self.repo {
      Some(repo) => vec!["-R", repo.as_str()],
      None => Vec::new(),
    }
  }

  /// Run gh and turn a non-zero exit into `StoreError::CommandFailed`
  fn run<I, S>(&self, label: &str, args: I) -> StoreResult<Output>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
  {
    let mut cmd = self.gh_cmd();
    cmd.args(args).args(self.repo_args());
    tracing::debug!(command = label, repo = ?self.repo, "running gh");

    let output = cmd.output().map_err(|e| StoreError::Unavailable {
      command: label.to_string(),
      reason: e.to_string(),
    })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(StoreError::CommandFailed {
        command: label.to_string(),
        stderr: self.scrub(&stderr),
      });
    }

    Ok(output)
  }

  fn scrub(&self, text: &str) -> String {
    match &self.token {
      Some(token) => token.scrub(text),
      None => text.to_string(),
    }
  }

  fn view(&self, tag: &str) -> StoreResult<ReleaseRecord> {
    let output = self.run(
      "gh release view",
      ["release", "view", tag, "--json", "tagName,name,publishedAt"],
    )?;
    let release: GhRelease = serde_json::from_slice(&output.stdout)?;
    Ok(release.into())
  }
}

impl ReleaseStore for GithubStore {
  fn list(&self) -> StoreResult<Vec<ReleaseRecord>> {
    let output = self.run(
      "gh release list",
      [
        "release",
        "list",
        "--exclude-drafts",
        "--limit",
        LIST_LIMIT,
        "--json",
        "tagName,name,publishedAt",
      ],
    )?;
    parse_release_list(&output.stdout)
  }

  fn create(&self, release: &NewRelease) -> StoreResult<ReleaseRecord> {
    let mut args: Vec<&OsStr> = vec![
      OsStr::new("release"),
      OsStr::new("create"),
      OsStr::new(&release.tag),
      release.artifact.as_os_str(),
      OsStr::new("--title"),
      OsStr::new(&release.title),
      OsStr::new("--notes"),
      OsStr::new(""),
    ];
    if let Some(target) = &release.target {
      args.push(OsStr::new("--target"));
      args.push(OsStr::new(target));
    }
    self.run("gh release create", args)?;

    // The release exists from here on; a failed read-back must not fail publication.
    match self.view(&release.tag) {
      Ok(record) => Ok(record),
      Err(e) => {
        tracing::warn!(tag = %release.tag, error = %e, "created release but could not read it back");
        Ok(ReleaseRecord {
          tag: release.tag.clone(),
          title: release.title.clone(),
          published_at: Utc::now(),
        })
      }
    }
  }

  fn delete(&self, tag: &str) -> StoreResult<()> {
    self.run("gh release delete", ["release", "delete", tag, "--yes", "--cleanup-tag"])?;
    Ok(())
  }
}

fn parse_release_list(stdout: &[u8]) -> StoreResult<Vec<ReleaseRecord>> {
  let releases: Vec<GhRelease> = serde_json::from_slice(stdout)?;
  Ok(releases.into_iter().map(ReleaseRecord::from).collect())
}
