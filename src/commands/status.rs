//! `release-cycle status`

use crate::core::context::CycleContext;
use crate::core::error::CycleResult;
use crate::cycle::lookup;
use crate::cycle::retention::{self, RetentionDecision};
use crate::store::ReleaseRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One stored release as seen by the retention enforcer
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseStatus {
  pub tag: String,
  pub title: String,
  pub published_at: DateTime<Utc>,
  /// Title parsed as a timestamp, RFC 3339; `None` when it does not parse
  pub title_timestamp: Option<String>,
  /// Deleted by the next successful publish
  pub evict_next: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
  pub keep: usize,
  /// What the next cycle would pass to the producer
  pub since: String,
  pub releases: Vec<ReleaseStatus>,
  /// Set when an unparsable title would abort the next retention pass
  pub retention_blocked_by: Option<String>,
}

/// Show stored releases and what the next publish would delete
pub fn run_status(ctx: &CycleContext, json: bool) -> CycleResult<()> {
  let store = ctx.open_store();
  let records = store.list()?;
  let status = build_status(records, ctx);

  if json {
    println!("{}", serde_json::to_string_pretty(&status)?);
  } else {
    print_status(&status);
  }
  Ok(())
}

fn build_status(mut records: Vec<ReleaseRecord>, ctx: &CycleContext) -> StoreStatus {
  let since = match lookup::latest(&records) {
    Some(latest) => lookup::format_since(latest.published_at),
    None => ctx.config.default_since.clone(),
  };

  let (decision, blocked) = match retention::preview_next(&records, &ctx.config.retention) {
    Ok(decision) => (decision, None),
    Err(e) => (RetentionDecision::default(), Some(e.tag)),
  };

  records.sort_by(|a, b| b.published_at.cmp(&a.published_at).then_with(|| a.tag.cmp(&b.tag)));
  let releases = records
    .into_iter()
    .map(|record| ReleaseStatus {
      title_timestamp: retention::parse_title(&record.title).map(|t| t.to_rfc3339()),
      evict_next: decision.evict.iter().any(|e| e.tag == record.tag),
      tag: record.tag,
      title: record.title,
      published_at: record.published_at,
    })
    .collect();

  StoreStatus {
    keep: ctx.config.retention.keep,
    since,
    releases,
    retention_blocked_by: blocked,
  }
}

fn print_status(status: &StoreStatus) {
  println!("📋 Releases ({} stored, keeping {})", status.releases.len(), status.keep);
  println!();

  if status.releases.is_empty() {
    println!("   No releases yet");
  }
  for release in &status.releases {
    let icon = if release.evict_next {
      "🗑️ "
    } else if release.title_timestamp.is_none() {
      "⚠️ "
    } else {
      "✅"
    };
    println!("{} {}", icon, release.tag);
    println!("   Title:     {}", release.title);
    println!("   Published: {}", release.published_at.to_rfc3339());
    if release.title_timestamp.is_none() {
      println!("   Title is not a timestamp");
    }
  }

  println!();
  println!("Next producer timestamp: {}", status.since);
  if let Some(tag) = &status.retention_blocked_by {
    println!("⚠️  Retention will fail on '{}' (title is not a timestamp)", tag);
  }
}
