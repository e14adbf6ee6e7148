//! In-memory release store for tests

use super::{NewRelease, ReleaseRecord, ReleaseStore, StoreResult};
use crate::core::error::StoreError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::{Cell, RefCell};

/// Records every mutation and can be told to fail any operation
#[derive(Default)]
pub struct MemoryStore {
  records: RefCell<Vec<ReleaseRecord>>,
  pub creates: Cell<usize>,
  pub deletes: RefCell<Vec<String>>,
  pub fail_list: Cell<bool>,
  pub fail_create: Cell<bool>,
  pub fail_delete: Cell<bool>,
}

impl MemoryStore {
  pub fn with_records(records: Vec<ReleaseRecord>) -> Self {
    Self {
      records: RefCell::new(records),
      ..Default::default()
    }
  }

  pub fn records(&self) -> Vec<ReleaseRecord> {
    self.records.borrow().clone()
  }

  pub fn tags(&self) -> Vec<String> {
    let mut tags: Vec<_> = self.records.borrow().iter().map(|r| r.tag.clone()).collect();
    tags.sort();
    tags
  }

  /// One hour after the newest record, so new releases are always the most recent
  fn next_published_at(&self) -> DateTime<Utc> {
    self
      .records
      .borrow()
      .iter()
      .map(|r| r.published_at)
      .max()
      .map(|t| t + Duration::hours(1))
      .unwrap_or_else(|| Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
  }
}

impl ReleaseStore for MemoryStore {
  fn list(&self) -> StoreResult<Vec<ReleaseRecord>> {
    if self.fail_list.get() {
      return Err(StoreError::Other("store unreachable".to_string()));
    }
    Ok(self.records())
  }

  fn create(&self, release: &NewRelease) -> StoreResult<ReleaseRecord> {
    if self.fail_create.get() {
      return Err(StoreError::Other("create rejected".to_string()));
    }
    if self.records.borrow().iter().any(|r| r.tag == release.tag) {
      return Err(StoreError::DuplicateTag {
        tag: release.tag.clone(),
      });
    }
    let record = ReleaseRecord {
      tag: release.tag.clone(),
      title: release.title.clone(),
      published_at: self.next_published_at(),
    };
    self.records.borrow_mut().push(record.clone());
    self.creates.set(self.creates.get() + 1);
    Ok(record)
  }

  fn delete(&self, tag: &str) -> StoreResult<()> {
    if self.fail_delete.get() {
      return Err(StoreError::Other("delete rejected".to_string()));
    }
    let mut records = self.records.borrow_mut();
    let before = records.len();
    records.retain(|r| r.tag != tag);
    if records.len() == before {
      return Err(StoreError::NotFound { tag: tag.to_string() });
    }
    self.deletes.borrow_mut().push(tag.to_string());
    Ok(())
  }
}
