//! Cycle sequencing
//!
//! lookup → invoke → (package → publish → retain) | skip | fail
//!
//! Each stage blocks on the previous one. Deletion is only reachable after a
//! successful create in the same cycle, and nothing touches the store before
//! the producer has succeeded. Files a previous cycle left in the work
//! directory are removed before the producer starts, so only what this run
//! wrote can be packaged.

use super::{lookup, package, publish, retention};
use crate::core::config::CycleConfig;
use crate::core::error::{CycleError, CycleResult, ProducerError};
use crate::cycle::package::Artifact;
use crate::producer::{Producer, ProducerOutcome};
use crate::store::{NewRelease, ReleaseRecord, ReleaseStore};
use serde::Serialize;
use std::path::Path;

/// Per-run inputs that do not come from the config file
#[derive(Debug, Clone)]
pub struct CycleOptions {
  /// Full source revision being released
  pub revision: String,
  /// Identifier unique to this run (CI run id)
  pub run_id: String,
  /// Stop after packaging and report what would be published
  pub dry_run: bool,
}

/// Result of one cycle that did not abort
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
  /// Timestamp passed to the producer
  pub since: String,
  #[serde(flatten)]
  pub outcome: CycleOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
  /// New release created, old ones pruned
  Published {
    release: ReleaseRecord,
    artifact: Artifact,
    evicted: Vec<String>,
  },
  /// Producer found no new data
  Skipped { code: i32 },
  /// Packaged but not published
  DryRun {
    tag: String,
    title: String,
    artifact: Artifact,
    would_evict: Vec<String>,
  },
}

pub struct Controller<'a> {
  config: &'a CycleConfig,
  workdir: &'a Path,
  store: &'a dyn ReleaseStore,
  producer: &'a dyn Producer,
}

impl<'a> Controller<'a> {
  pub fn new(
    config: &'a CycleConfig,
    workdir: &'a Path,
    store: &'a dyn ReleaseStore,
    producer: &'a dyn Producer,
  ) -> Self {
    Self {
      config,
      workdir,
      store,
      producer,
    }
  }

  /// Run one cycle to a terminal outcome
  pub fn run_cycle(&self, options: &CycleOptions) -> CycleResult<CycleReport> {
    let since = lookup::prior_release_timestamp(self.store, &self.config.default_since)?;
    tracing::info!(since = %since, "prior release timestamp");

    package::clear_previous(self.workdir, &self.config.package)?;
    let outcome = self.producer.run(&since)?;
    match outcome {
      ProducerOutcome::Success => {}
      ProducerOutcome::NoChangeLow | ProducerOutcome::NoChangeHigh => {
        let code = outcome.skip_code().unwrap_or_default();
        tracing::info!(code, "producer reported no new data, skipping release");
        return Ok(CycleReport {
          since,
          outcome: CycleOutcome::Skipped { code },
        });
      }
      ProducerOutcome::Failure(failure) => {
        return Err(
          ProducerError::Failed {
            program: self.config.producer.program.clone(),
            failure,
          }
          .into(),
        );
      }
    }

    let artifact = package::package_outputs(self.workdir, &self.config.package)?;
    let title = publish::read_title(&self.workdir.join(&self.config.package.title_file))?;
    let tag = publish::release_tag(&options.revision, &options.run_id);

    if options.dry_run {
      let records = self.store.list()?;
      let would_evict = retention::preview_next(&records, &self.config.retention)
        .map(|d| d.evict.into_iter().map(|r| r.tag).collect())
        .map_err(|e| {
          CycleError::with_help(
            format!("Release '{}' has a title that is not a timestamp: '{}'", e.tag, e.title),
            "Set `retention.on_unparsable = \"ignore\"` to leave such releases alone.",
          )
        })?;
      return Ok(CycleReport {
        since,
        outcome: CycleOutcome::DryRun {
          tag,
          title,
          artifact,
          would_evict,
        },
      });
    }

    let release = publish::publish(
      self.store,
      &NewRelease {
        tag,
        title,
        artifact: artifact.path.clone(),
        target: Some(options.revision.clone()),
      },
    )?;

    let evicted = retention::enforce(self.store, &self.config.retention, &release)?;

    Ok(CycleReport {
      since,
      outcome: CycleOutcome::Published {
        release,
        artifact,
        evicted,
      },
    })
  }
}
