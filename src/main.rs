mod commands;
mod core;
mod cycle;
mod producer;
mod store;

use clap::{Parser, Subcommand};
use crate::core::config::CycleConfig;
use crate::core::context::CycleContext;
use crate::core::error::{CycleError, CycleResult, print_error};
use crate::core::secret::Secret;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "release_cycle=warn";

/// Run a data producer on a schedule, publish its outputs as a release, prune old releases
#[derive(Parser)]
#[command(name = "release-cycle")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Config file (default: search cycle.toml, .cycle.toml, .config/cycle.toml)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Directory the producer runs in and outputs are collected from
  #[arg(long, global = true, default_value = ".")]
  workdir: PathBuf,

  /// Log filter, e.g. `debug` or `release_cycle=trace` (overrides RUST_LOG)
  #[arg(long, global = true)]
  log_level: Option<String>,

  /// Release store token
  #[arg(long, global = true, env = "GH_TOKEN", hide_env_values = true)]
  token: Option<String>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run one release cycle: lookup, produce, package, publish, prune
  Run {
    /// Package but do not publish or delete anything
    #[arg(long)]
    dry_run: bool,
    /// Output the cycle report in JSON format
    #[arg(long)]
    json: bool,
    /// Identifier unique to this run, used in the release tag
    #[arg(long, env = "GITHUB_RUN_ID")]
    run_id: Option<String>,
    /// Source revision being released (default: HEAD of the work directory)
    #[arg(long, env = "GITHUB_SHA")]
    revision: Option<String>,
  },

  /// Print the timestamp the producer would be invoked with
  Since,

  /// Show stored releases and what the next publish would delete
  Status {
    /// Output status in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Write a default cycle.toml
  Init {
    /// GitHub repository (owner/name) to publish to
    #[arg(long, conflicts_with = "local")]
    repo: Option<String>,
    /// Use the directory-backed store instead of GitHub
    #[arg(long)]
    local: bool,
    /// Overwrite an existing cycle.toml
    #[arg(long)]
    force: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging(level: Option<&str>) {
  let filter = match level {
    Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_ansi(std::io::stderr().is_terminal())
    .with_writer(std::io::stderr)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.log_level.as_deref());

  let token = cli.token.filter(|t| !t.is_empty()).map(Secret::new);

  let ctx = match CycleContext::build(&cli.workdir, cli.config.as_deref(), token.clone()) {
    Ok(ctx) => ctx,
    Err(e) if matches!(cli.command, Commands::Init { force: true, .. }) => {
      // init --force replaces a broken config, so it must not need to load it
      tracing::warn!(error = %e, "ignoring existing config");
      match try_minimal_context(&cli.workdir, token) {
        Ok(ctx) => ctx,
        Err(e) => handle_error(e),
      }
    }
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Run {
      dry_run,
      json,
      run_id,
      revision,
    } => commands::run_cycle(
      &ctx,
      commands::RunArgs {
        dry_run,
        json,
        run_id,
        revision,
      },
    ),
    Commands::Since => commands::run_since(&ctx),
    Commands::Status { json } => commands::run_status(&ctx, json),
    Commands::Init { repo, local, force } => commands::run_init(&ctx, repo, local, force),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: CycleError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}

/// Context with default config, for `init --force` over an unreadable file
fn try_minimal_context(workdir: &std::path::Path, token: Option<Secret>) -> CycleResult<CycleContext> {
  Ok(CycleContext {
    workdir: workdir.canonicalize()?,
    config: CycleConfig::default(),
    token,
  })
}
