//! Producer backed by an external program

use super::{ExitFailure, Producer, ProducerOutcome};
use crate::core::config::ProducerConfig;
use crate::core::error::{CycleResult, ProducerError};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Runs `program [args..] <since>` inside the work directory
///
/// The producer's stdout is forwarded to our stderr so it stays visible in CI
/// logs without mixing into `--json` output on stdout.
pub struct ProcessProducer {
  program: PathBuf,
  args: Vec<String>,
  workdir: PathBuf,
  timeout: Option<Duration>,
}

impl ProcessProducer {
  pub fn new(config: &ProducerConfig, workdir: &Path) -> Self {
    Self {
      program: resolve_program(&config.program, workdir),
      args: config.args.clone(),
      workdir: workdir.to_path_buf(),
      timeout: (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs)),
    }
  }

  fn command(&self, since: &str) -> Command {
    let mut cmd = Command::new(&self.program);
    cmd
      .args(&self.args)
      .arg(since)
      .current_dir(&self.workdir)
      .stdin(Stdio::null())
      .stdout(Stdio::from(io::stderr()))
      .stderr(Stdio::inherit());
    cmd
  }

  /// `None` when the timeout expired; the child has been killed and reaped
  fn wait(&self, child: &mut Child) -> io::Result<Option<ExitStatus>> {
    let Some(timeout) = self.timeout else {
      return child.wait().map(Some);
    };

    match child.wait_timeout(timeout)? {
      Some(status) => Ok(Some(status)),
      None => {
        tracing::warn!(program = %self.program.display(), secs = timeout.as_secs(), "producer timed out, killing it");
        child.kill()?;
        child.wait()?;
        Ok(None)
      }
    }
  }
}

impl Producer for ProcessProducer {
  fn run(&self, since: &str) -> CycleResult<ProducerOutcome> {
    tracing::info!(program = %self.program.display(), since, "invoking producer");

    let mut child = self.command(since).spawn().map_err(|e| ProducerError::Spawn {
      program: self.program.clone(),
      reason: e.to_string(),
    })?;

    let status = self.wait(&mut child).map_err(|e| ProducerError::Spawn {
      program: self.program.clone(),
      reason: format!("failed while waiting: {}", e),
    })?;

    let outcome = match status {
      Some(status) => ProducerOutcome::from_code(status.code()),
      None => ProducerOutcome::Failure(ExitFailure::TimedOut {
        secs: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
      }),
    };

    tracing::debug!(?outcome, "producer finished");
    Ok(outcome)
  }
}

/// Resolve a relative program path with a directory part against the work directory
///
/// Bare names like `dump` are left for PATH lookup.
fn resolve_program(program: &Path, workdir: &Path) -> PathBuf {
  if program.is_relative() && program.components().count() > 1 {
    workdir.join(program)
  } else {
    program.to_path_buf()
  }
}
