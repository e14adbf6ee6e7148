//! Retention: bound the number of stored releases
//!
//! Releases are ordered by the timestamp in their title, not by when the
//! store says they were published. The oldest go first. Equal timestamps are
//! ordered by tag so the choice is reproducible.

use crate::core::config::{RetentionConfig, UnparsablePolicy};
use crate::core::error::{CycleError, CycleResult, StoreError};
use crate::store::{ReleaseRecord, ReleaseStore};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Format release titles are expected to follow
pub const TITLE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Which releases to delete, computed fresh from a listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetentionDecision {
  /// Releases to delete, oldest first
  pub evict: Vec<ReleaseRecord>,
  /// Tags whose title did not parse and were left out of the ordering
  pub skipped: Vec<String>,
}

/// A title that is not a timestamp, with `on_unparsable = "fail"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparsableTitle {
  pub tag: String,
  pub title: String,
}

pub fn parse_title(title: &str) -> Option<DateTime<FixedOffset>> {
  DateTime::parse_from_str(title.trim(), TITLE_FORMAT).ok()
}

/// Decide what to evict so that at most `keep` releases remain
///
/// Nothing is parsed while the store is within bounds. `protect` names a
/// release that must survive regardless of its title (the one just published).
pub fn plan_eviction(
  records: &[ReleaseRecord],
  keep: usize,
  policy: UnparsablePolicy,
  protect: Option<&str>,
) -> Result<RetentionDecision, UnparsableTitle> {
  if records.len() <= keep {
    return Ok(RetentionDecision::default());
  }
  let excess = records.len() - keep;

  let mut decision = RetentionDecision::default();
  let mut candidates = Vec::with_capacity(records.len());
  for record in records {
    if Some(record.tag.as_str()) == protect {
      continue;
    }
    match parse_title(&record.title) {
      Some(at) => candidates.push((at, record)),
      None => match policy {
        UnparsablePolicy::Fail => {
          return Err(UnparsableTitle {
            tag: record.tag.clone(),
            title: record.title.clone(),
          });
        }
        UnparsablePolicy::Ignore => {
          tracing::warn!(tag = %record.tag, title = %record.title, "release title is not a timestamp, leaving it alone");
          decision.skipped.push(record.tag.clone());
        }
      },
    }
  }

  candidates.sort_by(|(a_at, a), (b_at, b)| a_at.cmp(b_at).then_with(|| a.tag.cmp(&b.tag)));
  decision.evict = candidates
    .into_iter()
    .take(excess)
    .map(|(_, record)| record.clone())
    .collect();

  Ok(decision)
}

/// What the next successful publish would evict from `records`
///
/// One more release will exist after that publish, so one fewer of the
/// current ones can stay.
pub fn preview_next(records: &[ReleaseRecord], config: &RetentionConfig) -> Result<RetentionDecision, UnparsableTitle> {
  plan_eviction(records, config.keep.saturating_sub(1), config.on_unparsable, None)
}

/// List the store and delete the oldest releases beyond `config.keep`
///
/// Only called after `published` was created in this cycle. Failures here do
/// not unpublish it. Returns the deleted tags in deletion order.
pub fn enforce(
  store: &dyn ReleaseStore,
  config: &RetentionConfig,
  published: &ReleaseRecord,
) -> CycleResult<Vec<String>> {
  let retention_error = |tag: String, source: StoreError| CycleError::Retention {
    tag,
    published: published.tag.clone(),
    source,
  };

  let records = store
    .list()
    .map_err(|source| retention_error("<listing>".to_string(), source))?;

  let decision = plan_eviction(&records, config.keep, config.on_unparsable, Some(published.tag.as_str())).map_err(|e| {
    retention_error(
      e.tag,
      StoreError::Malformed {
        reason: format!("title '{}' does not match \"{}\"", e.title, TITLE_FORMAT),
      },
    )
  })?;

  let mut evicted = Vec::with_capacity(decision.evict.len());
  for record in decision.evict {
    tracing::info!(tag = %record.tag, title = %record.title, "deleting old release");
    store
      .delete(&record.tag)
      .map_err(|source| retention_error(record.tag.clone(), source))?;
    evicted.push(record.tag);
  }

  if evicted.is_empty() {
    tracing::debug!(count = records.len(), keep = config.keep, "retention: nothing to delete");
  }
  Ok(evicted)
}
