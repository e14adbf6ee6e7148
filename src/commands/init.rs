//! `release-cycle init`

use crate::core::config::{CycleConfig, StoreKind};
use crate::core::context::CycleContext;
use crate::core::error::CycleResult;

/// Write a default cycle.toml into the work directory
pub fn run_init(ctx: &CycleContext, repo: Option<String>, local: bool, force: bool) -> CycleResult<()> {
  let mut config = CycleConfig::default();
  config.store.repo = repo;
  if local {
    config.store.kind = StoreKind::Local;
  }

  let path = config.save(&ctx.workdir, force)?;

  println!("✅ Wrote {}", path.display());
  println!();
  println!("Next steps:");
  println!("  1. Point producer.program at the data producer binary");
  match config.store.kind {
    StoreKind::Github => println!("  2. Export GH_TOKEN (or pass --token) for the target repository"),
    StoreKind::Local => println!("  2. Releases will be stored under {}", config.store.path.display()),
  }
  println!("  3. Preview a cycle: release-cycle run --dry-run");

  Ok(())
}
