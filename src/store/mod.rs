//! Release store: the system of record for published releases
//!
//! The controller only ever needs three operations (list, create, delete), so
//! the store is a trait and the backends are interchangeable:
//!
//! - **github**: GitHub releases through the `gh` CLI
//! - **local**: a directory with a JSON manifest, for offline runs and tests

pub mod github;
pub mod local;
#[cfg(test)]
pub mod memory;

pub use github::GithubStore;
pub use local::LocalStore;

use crate::core::config::{StoreConfig, StoreKind};
use crate::core::error::StoreError;
use crate::core::secret::Secret;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub type StoreResult<T> = Result<T, StoreError>;

/// One published release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
  pub tag: String,
  /// Expected to hold the publication timestamp of the data
  pub title: String,
  pub published_at: DateTime<Utc>,
}

/// A release about to be created
#[derive(Debug, Clone)]
pub struct NewRelease {
  pub tag: String,
  pub title: String,
  pub artifact: PathBuf,
  /// Revision the tag should point at
  pub target: Option<String>,
}

pub trait ReleaseStore {
  /// All published releases, in no particular order
  fn list(&self) -> StoreResult<Vec<ReleaseRecord>>;

  /// Publish a release with its artifact attached
  fn create(&self, release: &NewRelease) -> StoreResult<ReleaseRecord>;

  /// Remove a release (and its tag) by tag name
  fn delete(&self, tag: &str) -> StoreResult<()>;
}

/// Build the configured store backend
///
/// Relative local store paths resolve against the work directory.
pub fn open_store(config: &StoreConfig, workdir: &Path, token: Option<Secret>) -> Box<dyn ReleaseStore> {
  match config.kind {
    StoreKind::Github => Box::new(GithubStore::new(config.repo.clone(), token, workdir)),
    StoreKind::Local => {
      if token.is_some() {
        tracing::debug!("local store ignores the provided token");
      }
      Box::new(LocalStore::new(workdir.join(&config.path)))
    }
  }
}
