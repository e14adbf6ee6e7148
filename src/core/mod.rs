//! Core building blocks shared by every command
//!
//! - **config**: cycle.toml parsing and validation
//! - **context**: Work directory, config and credential shared by all commands
//! - **error**: Error taxonomy with contextual help messages and exit codes
//! - **secret**: Redacting wrapper for the store credential
//! - **vcs**: Source revision lookup (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod secret;
pub mod vcs;
