//! Release publication: title, tag, create

use crate::core::error::{CycleError, CycleResult, PackagingError};
use crate::core::vcs::short_revision;
use crate::store::{NewRelease, ReleaseRecord, ReleaseStore};
use std::fs;
use std::path::Path;

/// Read the one-line title the producer left in the side-channel file
///
/// Only the first line counts, trimmed. A missing or blank file means the
/// producer broke its contract.
pub fn read_title(path: &Path) -> Result<String, PackagingError> {
  let content = fs::read_to_string(path).map_err(|_| PackagingError::TitleMissing {
    path: path.to_path_buf(),
  })?;
  let title = content.lines().next().unwrap_or_default().trim();
  if title.is_empty() {
    return Err(PackagingError::TitleEmpty {
      path: path.to_path_buf(),
    });
  }
  Ok(title.to_string())
}

/// Tag unique per run: `<short revision>-<run id>`
///
/// The same revision released by two runs gets two distinct tags, which also
/// makes a retried create fail loudly as a duplicate instead of clobbering.
pub fn release_tag(revision: &str, run_id: &str) -> String {
  format!("{}-{}", short_revision(revision), run_id.trim())
}

/// Create the release; any failure is a publication error and stops the cycle
pub fn publish(store: &dyn ReleaseStore, release: &NewRelease) -> CycleResult<ReleaseRecord> {
  tracing::info!(tag = %release.tag, title = %release.title, "publishing release");
  store.create(release).map_err(|source| CycleError::Publication {
    tag: release.tag.clone(),
    source,
  })
}
