//! Error types for release-cycle with contextual messages and exit codes
//!
//! Every fatal kind a cycle can end in has its own variant so the top level can
//! pick an exit code and a help line. An intentional skip by the producer is
//! not an error and never appears here.

use crate::producer::ExitFailure;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for release-cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args)
  User = 1,
  /// System error (store, git, network, I/O)
  System = 2,
  /// Contract violation between producer and controller
  Contract = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for release-cycle
#[derive(Debug)]
pub enum CycleError {
  /// Configuration errors
  Config(ConfigError),

  /// Release store unreachable or rejected a read
  Store(StoreError),

  /// Producer exited with an unexpected status
  Producer(ProducerError),

  /// Producer reported success but its outputs are inconsistent
  Packaging(PackagingError),

  /// Creating the new release failed; retention was not attempted
  Publication { tag: String, source: StoreError },

  /// Deleting an old release failed after a successful publish
  Retention {
    tag: String,
    published: String,
    source: StoreError,
  },

  /// Git operation errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// Another error with a line saying what was being attempted
  Context { context: String, source: Box<CycleError> },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl CycleError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    CycleError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    CycleError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      CycleError::Message { message, context, help } => CycleError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      other => CycleError::Context {
        context: ctx_str,
        source: Box::new(other),
      },
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      CycleError::Config(_) => ExitCode::User,
      CycleError::Store(_) => ExitCode::System,
      CycleError::Producer(_) => ExitCode::Contract,
      CycleError::Packaging(_) => ExitCode::Contract,
      CycleError::Publication { .. } => ExitCode::System,
      CycleError::Retention { .. } => ExitCode::System,
      CycleError::Git(_) => ExitCode::System,
      CycleError::Io(_) => ExitCode::System,
      CycleError::Context { source, .. } => source.exit_code(),
      CycleError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      CycleError::Config(e) => e.help_message(),
      CycleError::Store(e) => e.help_message(),
      CycleError::Producer(e) => e.help_message(),
      CycleError::Packaging(_) => Some(
        "The producer exited 0 but did not leave the files it promised. Check the producer, not the store.".to_string(),
      ),
      CycleError::Publication { source, .. } => source
        .help_message()
        .or_else(|| Some("Nothing was deleted. The next scheduled cycle will retry.".to_string())),
      CycleError::Retention { published, .. } => Some(format!(
        "Release '{}' stays published. The next successful cycle evicts the surplus.",
        published
      )),
      CycleError::Git(e) => e.help_message(),
      CycleError::Context { source, .. } => source.help_message(),
      CycleError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for CycleError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CycleError::Config(e) => write!(f, "{}", e),
      CycleError::Store(e) => write!(f, "Release store error: {}", e),
      CycleError::Producer(e) => write!(f, "{}", e),
      CycleError::Packaging(e) => write!(f, "Packaging consistency error: {}", e),
      CycleError::Publication { tag, source } => {
        write!(f, "Failed to publish release '{}': {}", tag, source)
      }
      CycleError::Retention { tag, source, .. } => {
        write!(f, "Failed to delete old release '{}': {}", tag, source)
      }
      CycleError::Git(e) => write!(f, "{}", e),
      CycleError::Io(e) => write!(f, "I/O error: {}", e),
      CycleError::Context { context, source } => write!(f, "{}: {}", context, source),
      CycleError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for CycleError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      CycleError::Io(e) => Some(e),
      CycleError::Context { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for CycleError {
  fn from(err: io::Error) -> Self {
    CycleError::Io(err)
  }
}

impl From<String> for CycleError {
  fn from(msg: String) -> Self {
    CycleError::message(msg)
  }
}

impl From<&str> for CycleError {
  fn from(msg: &str) -> Self {
    CycleError::message(msg)
  }
}

impl From<StoreError> for CycleError {
  fn from(err: StoreError) -> Self {
    CycleError::Store(err)
  }
}

impl From<ConfigError> for CycleError {
  fn from(err: ConfigError) -> Self {
    CycleError::Config(err)
  }
}

impl From<PackagingError> for CycleError {
  fn from(err: PackagingError) -> Self {
    CycleError::Packaging(err)
  }
}

impl From<ProducerError> for CycleError {
  fn from(err: ProducerError) -> Self {
    CycleError::Producer(err)
  }
}

impl From<GitError> for CycleError {
  fn from(err: GitError) -> Self {
    CycleError::Git(err)
  }
}

impl From<serde_json::Error> for CycleError {
  fn from(err: serde_json::Error) -> Self {
    CycleError::message(format!("JSON error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for CycleError {
  fn from(err: toml_edit::ser::Error) -> Self {
    CycleError::message(format!("TOML serialization error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Explicit --config path does not exist
  NotFound { path: PathBuf },

  /// File exists but is not valid TOML for the schema
  Parse { path: PathBuf, reason: String },

  /// A field holds a value the controller cannot work with
  Invalid { field: String, reason: String },

  /// `init` would overwrite an existing file
  AlreadyExists { path: PathBuf },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Run `release-cycle init` to create a configuration file.".to_string()),
      ConfigError::AlreadyExists { .. } => Some("Pass --force to overwrite it.".to_string()),
      ConfigError::Invalid { field, .. } => Some(format!("Fix `{}` in cycle.toml.", field)),
      ConfigError::Parse { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => {
        write!(f, "Configuration file not found: {}", path.display())
      }
      ConfigError::Parse { path, reason } => {
        write!(f, "Failed to parse config from {}: {}", path.display(), reason)
      }
      ConfigError::Invalid { field, reason } => {
        write!(f, "Invalid config value for `{}`: {}", field, reason)
      }
      ConfigError::AlreadyExists { path } => {
        write!(f, "Config file already exists: {}", path.display())
      }
    }
  }
}

/// Release store errors
#[derive(Debug)]
pub enum StoreError {
  /// Store client binary could not be started
  Unavailable { command: String, reason: String },

  /// Store command ran and reported failure
  CommandFailed { command: String, stderr: String },

  /// Store returned data that does not match the expected shape
  Malformed { reason: String },

  /// A release with this tag already exists
  DuplicateTag { tag: String },

  /// No release with this tag exists
  NotFound { tag: String },

  /// Local store I/O failure
  Io(io::Error),

  /// Injected or otherwise unclassified failure
  Other(String),
}

impl StoreError {
  fn help_message(&self) -> Option<String> {
    match self {
      StoreError::Unavailable { command, .. } if command.starts_with("gh") => {
        Some("Install the GitHub CLI (https://cli.github.com) or set `store.kind = \"local\"`.".to_string())
      }
      StoreError::CommandFailed { stderr, .. } => {
        let lower = stderr.to_lowercase();
        if lower.contains("401") || lower.contains("authentication") || lower.contains("gh auth login") {
          Some("Check the token passed via --token / GH_TOKEN.".to_string())
        } else if lower.contains("403") || lower.contains("permission") {
          Some("The token needs `contents: write` on the target repository.".to_string())
        } else {
          None
        }
      }
      StoreError::DuplicateTag { .. } => {
        Some("Tags combine the revision with the run id. Pass a fresh --run-id.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for StoreError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StoreError::Unavailable { command, reason } => write!(f, "could not run `{}`: {}", command, reason),
      StoreError::CommandFailed { command, stderr } => {
        write!(f, "`{}` failed\n{}", command, stderr.trim_end())
      }
      StoreError::Malformed { reason } => write!(f, "unexpected response: {}", reason),
      StoreError::DuplicateTag { tag } => write!(f, "release '{}' already exists", tag),
      StoreError::NotFound { tag } => write!(f, "release '{}' not found", tag),
      StoreError::Io(e) => write!(f, "{}", e),
      StoreError::Other(msg) => write!(f, "{}", msg),
    }
  }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
  fn from(err: io::Error) -> Self {
    StoreError::Io(err)
  }
}

impl From<serde_json::Error> for StoreError {
  fn from(err: serde_json::Error) -> Self {
    StoreError::Malformed {
      reason: err.to_string(),
    }
  }
}

/// Producer failures (anything other than 0, 20 and 21)
#[derive(Debug)]
pub enum ProducerError {
  /// Producer binary could not be started
  Spawn { program: PathBuf, reason: String },

  /// Producer ran and ended in an unexpected way
  Failed { program: PathBuf, failure: ExitFailure },
}

impl ProducerError {
  fn help_message(&self) -> Option<String> {
    match self {
      ProducerError::Spawn { program, .. } => Some(format!(
        "Build the producer first or point `producer.program` at it (currently {}).",
        program.display()
      )),
      ProducerError::Failed {
        failure: ExitFailure::TimedOut { .. },
        ..
      } => Some("Raise `producer.timeout_secs` or set it to 0 to disable the timeout.".to_string()),
      ProducerError::Failed { .. } => {
        Some("Exit codes 20 and 21 mean \"no new data\". Every other non-zero code aborts the cycle.".to_string())
      }
    }
  }
}

impl fmt::Display for ProducerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProducerError::Spawn { program, reason } => {
        write!(f, "Failed to start producer {}: {}", program.display(), reason)
      }
      ProducerError::Failed { program, failure } => {
        write!(f, "Producer {} failed: {}", program.display(), failure)
      }
    }
  }
}

/// Producer exited 0 but the files it promised are not usable
#[derive(Debug)]
pub enum PackagingError {
  /// One of the fixed output paths is absent
  MissingOutput { path: PathBuf },

  /// The archive was not written
  ArchiveMissing { path: PathBuf },

  /// The archive was written but has no bytes
  ArchiveEmpty { path: PathBuf },

  /// Writing the archive failed
  Archive { path: PathBuf, reason: String },

  /// Title side-channel file is absent
  TitleMissing { path: PathBuf },

  /// Title side-channel file has no text
  TitleEmpty { path: PathBuf },
}

impl fmt::Display for PackagingError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PackagingError::MissingOutput { path } => write!(f, "producer output missing: {}", path.display()),
      PackagingError::ArchiveMissing { path } => write!(f, "archive was not created: {}", path.display()),
      PackagingError::ArchiveEmpty { path } => write!(f, "archive is empty: {}", path.display()),
      PackagingError::Archive { path, reason } => {
        write!(f, "failed to write archive {}: {}", path.display(), reason)
      }
      PackagingError::TitleMissing { path } => write!(f, "title file missing: {}", path.display()),
      PackagingError::TitleEmpty { path } => write!(f, "title file is empty: {}", path.display()),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { .. } => Some("Pass --revision (or set GITHUB_SHA) when running outside a checkout.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// Result type alias for release-cycle
pub type CycleResult<T> = Result<T, CycleError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> CycleResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> CycleResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<CycleError>,
{
  fn context(self, ctx: impl Into<String>) -> CycleResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> CycleResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &CycleError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
