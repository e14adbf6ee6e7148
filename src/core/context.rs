//! Cycle context - build once in main, pass to every command
//!
//! Holds the work directory, the loaded configuration, and the store
//! credential. The credential is taken from the command line here and handed
//! explicitly to whichever store gets built; nothing below reads it from the
//! environment.

use crate::core::config::CycleConfig;
use crate::core::error::{CycleResult, ResultExt};
use crate::core::secret::Secret;
use crate::store::{self, ReleaseStore};
use std::path::{Path, PathBuf};

pub struct CycleContext {
  /// Directory the producer runs in and outputs are collected from (absolute)
  pub workdir: PathBuf,

  /// Loaded (or default) configuration
  pub config: CycleConfig,

  /// Credential for the release store
  pub token: Option<Secret>,
}

impl CycleContext {
  /// Resolve the work directory and load configuration
  pub fn build(workdir: &Path, config_path: Option<&Path>, token: Option<Secret>) -> CycleResult<Self> {
    let workdir = workdir
      .canonicalize()
      .with_context(|| format!("Work directory not accessible: {}", workdir.display()))?;
    let config = CycleConfig::load(&workdir, config_path)?;

    Ok(Self { workdir, config, token })
  }

  /// Build the configured release store with the context's credential
  pub fn open_store(&self) -> Box<dyn ReleaseStore> {
    store::open_store(&self.config.store, &self.workdir, self.token.clone())
  }
}
