//! `release-cycle since`

use crate::core::context::CycleContext;
use crate::core::error::CycleResult;
use crate::cycle::lookup;

/// Print the timestamp the producer would be invoked with
pub fn run_since(ctx: &CycleContext) -> CycleResult<()> {
  let store = ctx.open_store();
  let since = lookup::prior_release_timestamp(store.as_ref(), &ctx.config.default_since)?;
  println!("{}", since);
  Ok(())
}
