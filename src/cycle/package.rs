//! Artifact packaging
//!
//! Bundles the producer's outputs, in their configured order, into one
//! zstd-compressed tar stream. Directory contents are added in sorted order
//! and headers carry no ownership or timestamps, so identical outputs give a
//! byte-identical archive.

use crate::core::config::PackageConfig;
use crate::core::error::{CycleError, CycleResult, PackagingError, ResultExt};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// A packaged, verified archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
  pub path: PathBuf,
  pub size: u64,
  /// Hex-encoded SHA-256 of the archive bytes
  pub sha256: String,
  /// Archive entry names in write order
  pub entries: Vec<PathBuf>,
}

/// Remove outputs, title file and archive left behind by an earlier cycle
///
/// Runs before the producer so that a producer exiting 0 without writing
/// anything fails packaging instead of republishing stale files.
pub fn clear_previous(workdir: &Path, config: &PackageConfig) -> CycleResult<()> {
  let stale = config.outputs.iter().chain([&config.title_file, &config.archive]);
  for rel in stale {
    let path = workdir.join(rel);
    let meta = match fs::symlink_metadata(&path) {
      Ok(meta) => meta,
      Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
      Err(e) => return Err(CycleError::from(e).context(format!("Failed to inspect {}", path.display()))),
    };
    let removed = if meta.is_dir() {
      fs::remove_dir_all(&path)
    } else {
      fs::remove_file(&path)
    };
    removed.with_context(|| format!("Failed to remove {} from the previous cycle", path.display()))?;
    tracing::debug!(path = %path.display(), "removed output of previous cycle");
  }
  Ok(())
}

/// Package the configured outputs found in `workdir` and verify the result
pub fn package_outputs(workdir: &Path, config: &PackageConfig) -> CycleResult<Artifact> {
  for output in &config.outputs {
    if fs::symlink_metadata(workdir.join(output)).is_err() {
      return Err(PackagingError::MissingOutput { path: output.clone() }.into());
    }
  }

  let archive_path = workdir.join(&config.archive);
  let entries = write_archive(workdir, config, &archive_path).map_err(|e| PackagingError::Archive {
    path: archive_path.clone(),
    reason: e.to_string(),
  })?;

  let size = verify_archive(&archive_path)?;
  let sha256 = sha256_file(&archive_path).map_err(|e| PackagingError::Archive {
    path: archive_path.clone(),
    reason: e.to_string(),
  })?;

  tracing::info!(
    archive = %archive_path.display(),
    size,
    sha256 = %sha256,
    entries = entries.len(),
    "packaged outputs"
  );

  Ok(Artifact {
    path: archive_path,
    size,
    sha256,
    entries,
  })
}

fn write_archive(workdir: &Path, config: &PackageConfig, archive_path: &Path) -> io::Result<Vec<PathBuf>> {
  let file = File::create(archive_path)?;
  let encoder = zstd::Encoder::new(file, config.level)?;
  let mut builder = tar::Builder::new(encoder);
  builder.mode(tar::HeaderMode::Deterministic);

  let mut names = Vec::new();
  for output in &config.outputs {
    for rel in collect_entries(workdir, output)? {
      let abs = workdir.join(&rel);
      if abs.is_dir() {
        builder.append_dir(&rel, &abs)?;
      } else {
        builder.append_path_with_name(&abs, &rel)?;
      }
      names.push(rel);
    }
  }

  let encoder = builder.into_inner()?;
  let file = encoder.finish()?;
  file.sync_all()?;
  Ok(names)
}

/// `rel` followed by everything below it, depth-first, siblings sorted by name
fn collect_entries(workdir: &Path, rel: &Path) -> io::Result<Vec<PathBuf>> {
  let mut out = vec![rel.to_path_buf()];
  let abs = workdir.join(rel);
  if abs.is_dir() {
    let mut children: Vec<_> = fs::read_dir(&abs)?
      .map(|entry| entry.map(|e| e.file_name()))
      .collect::<io::Result<_>>()?;
    children.sort();
    for child in children {
      out.extend(collect_entries(workdir, &rel.join(child))?);
    }
  }
  Ok(out)
}

/// Confirm the archive exists and has bytes; returns its size
fn verify_archive(path: &Path) -> Result<u64, PackagingError> {
  let meta = fs::metadata(path).map_err(|_| PackagingError::ArchiveMissing {
    path: path.to_path_buf(),
  })?;
  if !meta.is_file() {
    return Err(PackagingError::ArchiveMissing {
      path: path.to_path_buf(),
    });
  }
  if meta.len() == 0 {
    return Err(PackagingError::ArchiveEmpty {
      path: path.to_path_buf(),
    });
  }
  Ok(meta.len())
}

fn sha256_file(path: &Path) -> io::Result<String> {
  let mut file = File::open(path)?;
  let mut hasher = Sha256::new();
  io::copy(&mut file, &mut hasher)?;
  Ok(format!("{:x}", hasher.finalize()))
}
