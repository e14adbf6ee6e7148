use crate::core::error::{ConfigError, CycleResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Timestamp handed to the producer when the store holds no release yet.
/// Passed through verbatim.
pub const DEFAULT_SINCE: &str = "2025-04-04T01:00:00Z";

/// Configuration for release-cycle
/// Searched in order: cycle.toml, .cycle.toml, .config/cycle.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleConfig {
  /// Prior-release timestamp used when the store is empty
  #[serde(default = "default_since")]
  pub default_since: String,
  #[serde(default)]
  pub producer: ProducerConfig,
  #[serde(default)]
  pub package: PackageConfig,
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub retention: RetentionConfig,
}

fn default_since() -> String {
  DEFAULT_SINCE.to_string()
}

/// External producer invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerConfig {
  /// Producer binary (relative paths resolve against the work directory)
  #[serde(default = "default_program")]
  pub program: PathBuf,

  /// Extra arguments placed before the timestamp
  #[serde(default)]
  pub args: Vec<String>,

  /// Kill the producer after this many seconds (0 = wait forever)
  #[serde(default)]
  pub timeout_secs: u64,
}

fn default_program() -> PathBuf {
  PathBuf::from("./target/release/dump")
}

impl Default for ProducerConfig {
  fn default() -> Self {
    Self {
      program: default_program(),
      args: Vec::new(),
      timeout_secs: 0,
    }
  }
}

/// What the producer leaves behind and how it is bundled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageConfig {
  /// Output paths, archived in this order
  #[serde(default = "default_outputs")]
  pub outputs: Vec<PathBuf>,

  /// Archive file name, written into the work directory
  #[serde(default = "default_archive")]
  pub archive: PathBuf,

  /// One-line release title written by the producer
  #[serde(default = "default_title_file")]
  pub title_file: PathBuf,

  /// zstd compression level
  #[serde(default = "default_level")]
  pub level: i32,
}

fn default_outputs() -> Vec<PathBuf> {
  vec![
    PathBuf::from("categories"),
    PathBuf::from("keywords"),
    PathBuf::from("dump"),
  ]
}

fn default_archive() -> PathBuf {
  PathBuf::from("data.tar.zst")
}

fn default_title_file() -> PathBuf {
  PathBuf::from("last_updated")
}

fn default_level() -> i32 {
  19
}

impl Default for PackageConfig {
  fn default() -> Self {
    Self {
      outputs: default_outputs(),
      archive: default_archive(),
      title_file: default_title_file(),
      level: default_level(),
    }
  }
}

/// Which release store backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
  /// GitHub releases through the `gh` CLI
  #[default]
  Github,
  /// Directory-backed store (offline runs, tests)
  Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
  #[serde(default)]
  pub kind: StoreKind,

  /// `owner/name` for the github store; gh infers it from the checkout when unset
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub repo: Option<String>,

  /// Directory for the local store
  #[serde(default = "default_store_path")]
  pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
  PathBuf::from(".releases")
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      kind: StoreKind::default(),
      repo: None,
      path: default_store_path(),
    }
  }
}

/// What to do with a release whose title does not parse as a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnparsablePolicy {
  /// Abort retention with an error
  #[default]
  Fail,
  /// Leave the release alone and pick among the parseable ones
  Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
  /// Maximum number of releases left after a cycle
  #[serde(default = "default_keep")]
  pub keep: usize,

  #[serde(default)]
  pub on_unparsable: UnparsablePolicy,
}

fn default_keep() -> usize {
  2
}

impl Default for RetentionConfig {
  fn default() -> Self {
    Self {
      keep: default_keep(),
      on_unparsable: UnparsablePolicy::default(),
    }
  }
}

impl Default for CycleConfig {
  fn default() -> Self {
    Self {
      default_since: default_since(),
      producer: ProducerConfig::default(),
      package: PackageConfig::default(),
      store: StoreConfig::default(),
      retention: RetentionConfig::default(),
    }
  }
}

impl CycleConfig {
  /// Find config file in search order: cycle.toml, .cycle.toml, .config/cycle.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("cycle.toml"),
      path.join(".cycle.toml"),
      path.join(".config").join("cycle.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from an explicit file, the search path, or fall back to defaults
  pub fn load(workdir: &Path, explicit: Option<&Path>) -> CycleResult<Self> {
    let config_path = match explicit {
      Some(path) => {
        if !path.exists() {
          return Err(ConfigError::NotFound { path: path.to_path_buf() }.into());
        }
        path.to_path_buf()
      }
      None => match Self::find_config_path(workdir) {
        Some(path) => path,
        None => {
          tracing::debug!(workdir = %workdir.display(), "no config file found, using defaults");
          return Ok(Self::default());
        }
      },
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content, &config_path)?;
    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok(config)
  }

  /// Parse and validate config text
  pub fn parse(content: &str, origin: &Path) -> CycleResult<Self> {
    let config: CycleConfig = toml_edit::de::from_str(content).map_err(|e| ConfigError::Parse {
      path: origin.to_path_buf(),
      reason: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
  }

  /// Save config to cycle.toml in `dir`
  pub fn save(&self, dir: &Path, force: bool) -> CycleResult<PathBuf> {
    let config_path = dir.join("cycle.toml");
    if config_path.exists() && !force {
      return Err(ConfigError::AlreadyExists { path: config_path }.into());
    }
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(config_path)
  }

  /// Reject values no cycle could run with
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.producer.program.as_os_str().is_empty() {
      return Err(invalid("producer.program", "must not be empty"));
    }

    if self.package.outputs.is_empty() {
      return Err(invalid("package.outputs", "at least one output path is required"));
    }
    let mut seen = HashSet::new();
    for output in &self.package.outputs {
      if output.as_os_str().is_empty() {
        return Err(invalid("package.outputs", "contains an empty path"));
      }
      if !seen.insert(output) {
        return Err(invalid(
          "package.outputs",
          &format!("'{}' is listed twice", output.display()),
        ));
      }
    }
    if self.package.archive.as_os_str().is_empty() {
      return Err(invalid("package.archive", "must not be empty"));
    }
    if self.package.title_file.as_os_str().is_empty() {
      return Err(invalid("package.title_file", "must not be empty"));
    }

    // All of these are removed before each producer run
    let named = self
      .package
      .outputs
      .iter()
      .map(|p| ("package.outputs", p))
      .chain([
        ("package.archive", &self.package.archive),
        ("package.title_file", &self.package.title_file),
      ]);
    for (field, path) in named {
      if !stays_inside(path) {
        return Err(invalid(
          field,
          &format!("'{}' must be a relative path inside the work directory", path.display()),
        ));
      }
    }
    for (field, path) in [
      ("package.archive", &self.package.archive),
      ("package.title_file", &self.package.title_file),
    ] {
      if let Some(output) = self.package.outputs.iter().find(|o| overlaps(o, path)) {
        return Err(invalid(
          field,
          &format!("'{}' overlaps the output '{}'", path.display(), output.display()),
        ));
      }
    }
    if overlaps(&self.package.archive, &self.package.title_file) {
      return Err(invalid("package.archive", "must differ from package.title_file"));
    }
    if !(1..=22).contains(&self.package.level) {
      return Err(invalid(
        "package.level",
        &format!("{} is outside the zstd range 1..=22", self.package.level),
      ));
    }

    if self.retention.keep == 0 {
      return Err(invalid("retention.keep", "must keep at least the release just published"));
    }

    Ok(())
  }
}

/// Relative, no `..`, and names something below the work directory itself
fn stays_inside(path: &Path) -> bool {
  path.components().any(|c| matches!(c, Component::Normal(_)))
    && path
      .components()
      .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// One path equals the other or lies below it
fn overlaps(a: &Path, b: &Path) -> bool {
  let (a, b) = (normal_components(a), normal_components(b));
  a.starts_with(&b) || b.starts_with(&a)
}

fn normal_components(path: &Path) -> Vec<Component<'_>> {
  path.components().filter(|c| !matches!(c, Component::CurDir)).collect()
}

fn invalid(field: &str, reason: &str) -> ConfigError {
  ConfigError::Invalid {
    field: field.to_string(),
    reason: reason.to_string(),
  }
}
