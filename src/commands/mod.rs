//! CLI commands for release-cycle
//!
//! - **run**: Execute one full release cycle
//! - **since**: Print the prior-release timestamp the producer would receive
//! - **status**: Show stored releases and what the next publish would evict
//! - **init**: Write a default cycle.toml
//!
//! All commands accept `&CycleContext` so config and credential load once.

pub mod init;
pub mod run;
pub mod since;
pub mod status;

pub use init::run_init;
pub use run::{RunArgs, run_cycle};
pub use since::run_since;
pub use status::run_status;
