//! `release-cycle run`

use crate::core::context::CycleContext;
use crate::core::error::{CycleError, CycleResult};
use crate::core::vcs::SystemGit;
use crate::cycle::{Controller, CycleOptions, CycleOutcome, CycleReport};
use crate::producer::ProcessProducer;
use chrono::Utc;

pub struct RunArgs {
  pub dry_run: bool,
  pub json: bool,
  pub run_id: Option<String>,
  pub revision: Option<String>,
}

/// Run one release cycle
pub fn run_cycle(ctx: &CycleContext, args: RunArgs) -> CycleResult<()> {
  let run_id = resolve_run_id(args.run_id)?;
  let revision = match args.revision {
    Some(rev) => rev,
    None => SystemGit::open(&ctx.workdir)?.head_commit()?,
  };

  let store = ctx.open_store();
  let producer = ProcessProducer::new(&ctx.config.producer, &ctx.workdir);
  let controller = Controller::new(&ctx.config, &ctx.workdir, store.as_ref(), &producer);

  let report = controller.run_cycle(&CycleOptions {
    revision,
    run_id,
    dry_run: args.dry_run,
  })?;

  if args.json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    print_report(&report);
  }

  Ok(())
}

/// The run id ends up in the release tag, so it must be a non-empty token
fn resolve_run_id(run_id: Option<String>) -> CycleResult<String> {
  let Some(run_id) = run_id else {
    let id = Utc::now().timestamp_millis().to_string();
    tracing::warn!(run_id = %id, "no run id given, using current time");
    return Ok(id);
  };

  let run_id = run_id.trim();
  if run_id.is_empty() || run_id.contains(char::is_whitespace) {
    return Err(CycleError::with_help(
      format!("Invalid run id '{}'", run_id),
      "Pass --run-id (or set GITHUB_RUN_ID) to a non-empty value without spaces, unique to this run.",
    ));
  }
  Ok(run_id.to_string())
}

fn print_report(report: &CycleReport) {
  println!("🕒 Prior release: {}", report.since);

  match &report.outcome {
    CycleOutcome::Skipped { code } => {
      println!("⏭️  No new data (producer exit {}). Nothing published.", code);
    }
    CycleOutcome::Published {
      release,
      artifact,
      evicted,
    } => {
      println!("📦 Packaged {} ({} bytes)", artifact.path.display(), artifact.size);
      println!("   sha256: {}", artifact.sha256);
      println!("🚀 Published {} \"{}\"", release.tag, release.title);
      if evicted.is_empty() {
        println!("   No old releases to delete");
      }
      for tag in evicted {
        println!("🗑️  Deleted {}", tag);
      }
      println!();
      println!("✅ Cycle complete");
    }
    CycleOutcome::DryRun {
      tag,
      title,
      artifact,
      would_evict,
    } => {
      println!("📦 Packaged {} ({} bytes)", artifact.path.display(), artifact.size);
      println!("   sha256: {}", artifact.sha256);
      println!("💡 Would publish {} \"{}\"", tag, title);
      for old in would_evict {
        println!("💡 Would delete {}", old);
      }
      println!();
      println!("🔍 Dry-run mode (no changes applied)");
    }
  }
}
