//! The release-cycle controller
//!
//! - **lookup**: timestamp of the most recent release (or the default)
//! - **package**: bundle producer outputs into one verified archive
//! - **publish**: read the title, build the tag, create the release
//! - **retention**: evict the oldest releases beyond the configured bound
//! - **controller**: sequence the stages into one cycle

pub mod controller;
pub mod lookup;
pub mod package;
pub mod publish;
pub mod retention;

pub use controller::{Controller, CycleOptions, CycleOutcome, CycleReport};
