//! Prior-release lookup

use crate::core::error::CycleResult;
use crate::store::{ReleaseRecord, ReleaseStore};
use chrono::{DateTime, Utc};

/// Format of the timestamp handed to the producer (day not zero-padded)
pub const SINCE_FORMAT: &str = "%a, %-d %b %Y %H:%M:%S %z";

/// Timestamp of the most recently published release, or `default` verbatim
///
/// Read-only. A store that cannot be listed fails the cycle before anything
/// else runs.
pub fn prior_release_timestamp(store: &dyn ReleaseStore, default: &str) -> CycleResult<String> {
  let records = store.list()?;
  let since = match latest(&records) {
    Some(record) => {
      tracing::debug!(tag = %record.tag, published_at = %record.published_at, "found prior release");
      format_since(record.published_at)
    }
    None => {
      tracing::debug!("no prior release, using default timestamp");
      default.to_string()
    }
  };
  Ok(since)
}

/// Most recently published record; ties go to the greater tag
pub fn latest(records: &[ReleaseRecord]) -> Option<&ReleaseRecord> {
  records.iter().max_by(|a, b| {
    a.published_at
      .cmp(&b.published_at)
      .then_with(|| a.tag.cmp(&b.tag))
  })
}

pub fn format_since(at: DateTime<Utc>) -> String {
  at.format(SINCE_FORMAT).to_string()
}
