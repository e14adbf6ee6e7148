//! The external producer, seen only through its exit status
//!
//! The producer decides whether new data exists and writes its outputs into
//! the work directory. The controller never reads its stdout; the exit status
//! is the whole control interface:
//!
//! | status | outcome |
//! |---|---|
//! | 0 | [`ProducerOutcome::Success`] |
//! | 20 | [`ProducerOutcome::NoChangeLow`] |
//! | 21 | [`ProducerOutcome::NoChangeHigh`] |
//! | anything else | [`ProducerOutcome::Failure`] |

pub mod process;

pub use process::ProcessProducer;

use crate::core::error::CycleResult;
use std::fmt;

/// Exit status for "no new data" (variant A)
pub const NO_CHANGE_LOW: i32 = 20;
/// Exit status for "no new data" (variant B)
pub const NO_CHANGE_HIGH: i32 = 21;

/// What one producer run amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerOutcome {
  /// New data; outputs and title file were written
  Success,
  /// Nothing new (exit 20)
  NoChangeLow,
  /// Nothing new (exit 21)
  NoChangeHigh,
  /// Anything else
  Failure(ExitFailure),
}

/// Ways a producer run can end other than the three recognized statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitFailure {
  /// Exited with an unrecognized status
  Code(i32),
  /// Terminated by a signal, no status available
  Signal,
  /// Killed after exceeding the configured timeout
  TimedOut { secs: u64 },
}

impl ProducerOutcome {
  /// Map a raw exit status onto the producer contract
  ///
  /// `None` means the process ended without a status (killed by a signal).
  pub fn from_code(code: Option<i32>) -> Self {
    match code {
      Some(0) => ProducerOutcome::Success,
      Some(NO_CHANGE_LOW) => ProducerOutcome::NoChangeLow,
      Some(NO_CHANGE_HIGH) => ProducerOutcome::NoChangeHigh,
      Some(other) => ProducerOutcome::Failure(ExitFailure::Code(other)),
      None => ProducerOutcome::Failure(ExitFailure::Signal),
    }
  }

  /// Sentinel status for the two "no new data" outcomes
  pub fn skip_code(&self) -> Option<i32> {
    match self {
      ProducerOutcome::NoChangeLow => Some(NO_CHANGE_LOW),
      ProducerOutcome::NoChangeHigh => Some(NO_CHANGE_HIGH),
      _ => None,
    }
  }
}

impl fmt::Display for ExitFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExitFailure::Code(code) => write!(f, "exit code {}", code),
      ExitFailure::Signal => write!(f, "terminated by signal"),
      ExitFailure::TimedOut { secs } => write!(f, "timed out after {}s", secs),
    }
  }
}

/// Capability boundary around the external producer
pub trait Producer {
  /// Run the producer once with the prior-release timestamp as its only argument
  fn run(&self, since: &str) -> CycleResult<ProducerOutcome>;
}
