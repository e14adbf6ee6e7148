//! Directory-backed release store
//!
//! Layout:
//!
//! ```text
//! <root>/releases.json        manifest: [{tag, title, published_at}]
//! <root>/<tag>/<artifact>     copy of the published artifact
//! ```

use super::{NewRelease, ReleaseRecord, ReleaseStore, StoreResult};
use crate::core::error::StoreError;
use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const MANIFEST: &str = "releases.json";

pub struct LocalStore {
  root: PathBuf,
}

impl LocalStore {
  pub fn new(root: PathBuf) -> Self {
    Self { root }
  }

  fn manifest_path(&self) -> PathBuf {
    self.root.join(MANIFEST)
  }

  fn load(&self) -> StoreResult<Vec<ReleaseRecord>> {
    let path = self.manifest_path();
    if !path.exists() {
      return Ok(Vec::new());
    }
    let content = fs::read(&path)?;
    Ok(serde_json::from_slice(&content)?)
  }

  /// Write the manifest through a temp file so a crash never leaves it half-written
  fn save(&self, records: &[ReleaseRecord]) -> StoreResult<()> {
    fs::create_dir_all(&self.root)?;
    let mut tmp = NamedTempFile::new_in(&self.root)?;
    serde_json::to_writer_pretty(&mut tmp, records)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(self.manifest_path()).map_err(|e| e.error)?;
    Ok(())
  }
}

impl ReleaseStore for LocalStore {
  fn list(&self) -> StoreResult<Vec<ReleaseRecord>> {
    self.load()
  }

  fn create(&self, release: &NewRelease) -> StoreResult<ReleaseRecord> {
    validate_tag(&release.tag)?;

    let mut records = self.load()?;
    if records.iter().any(|r| r.tag == release.tag) {
      return Err(StoreError::DuplicateTag {
        tag: release.tag.clone(),
      });
    }

    let file_name = release.artifact.file_name().ok_or_else(|| StoreError::Other(format!(
      "artifact path has no file name: {}",
      release.artifact.display()
    )))?;
    let release_dir = self.root.join(&release.tag);
    fs::create_dir_all(&release_dir)?;
    fs::copy(&release.artifact, release_dir.join(file_name))?;

    let record = ReleaseRecord {
      tag: release.tag.clone(),
      title: release.title.clone(),
      published_at: Utc::now(),
    };
    records.push(record.clone());
    self.save(&records)?;

    Ok(record)
  }

  fn delete(&self, tag: &str) -> StoreResult<()> {
    validate_tag(tag)?;

    let mut records = self.load()?;
    let before = records.len();
    records.retain(|r| r.tag != tag);
    if records.len() == before {
      return Err(StoreError::NotFound { tag: tag.to_string() });
    }
    self.save(&records)?;

    let release_dir = self.root.join(tag);
    if release_dir.exists() {
      fs::remove_dir_all(&release_dir)?;
    }
    Ok(())
  }
}

/// Tags become directory names, so they must be a single plain path component
fn validate_tag(tag: &str) -> StoreResult<()> {
  let path = Path::new(tag);
  let single_component = path.components().count() == 1
    && matches!(path.components().next(), Some(std::path::Component::Normal(_)));
  if tag.is_empty() || tag == MANIFEST || !single_component || tag.contains(['/', '\\']) {
    return Err(StoreError::Other(format!("invalid release tag '{}'", tag)));
  }
  Ok(())
}
