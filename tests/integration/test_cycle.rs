//! Integration tests for `release-cycle run`

use crate::helpers::{REVISION, T1, T2, T3, TestWorkdir, git, stderr, stdout};
use anyhow::Result;

#[test]
fn test_first_cycle_publishes_with_default_timestamp() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;

  let output = ws.cycle(T1, "100")?;

  assert_eq!(ws.seen_since()?, vec!["2025-04-04T01:00:00Z".to_string()]);
  assert_eq!(ws.release_tags()?, vec!["9fceb02-100".to_string()]);
  assert_eq!(ws.release_titles()?, vec![T1.to_string()]);
  assert!(ws.file_exists("releases/9fceb02-100/data.tar.zst"));
  assert!(stdout(&output).contains("Published 9fceb02-100"));

  Ok(())
}

#[test]
fn test_third_cycle_evicts_oldest_title() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;

  ws.cycle(T1, "1")?;
  ws.cycle(T2, "2")?;
  assert_eq!(ws.releases()?.len(), 2, "two releases fit without eviction");

  let output = ws.cycle(T3, "3")?;

  assert_eq!(ws.release_titles()?, vec![T2.to_string(), T3.to_string()]);
  assert_eq!(ws.release_tags()?, vec!["9fceb02-2".to_string(), "9fceb02-3".to_string()]);
  assert!(!ws.file_exists("releases/9fceb02-1"));
  assert!(stdout(&output).contains("Deleted 9fceb02-1"));

  Ok(())
}

#[test]
fn test_second_cycle_receives_prior_publication_time() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;

  ws.cycle(T1, "1")?;
  ws.cycle(T2, "2")?;

  let seen = ws.seen_since()?;
  assert_eq!(seen.len(), 2);
  // RFC 2822 style, e.g. "Sat, 3 May 2025 10:20:30 +0000"
  assert!(seen[1].ends_with(" +0000"), "unexpected timestamp: {}", seen[1]);
  assert_eq!(seen[1].split_whitespace().count(), 6);

  Ok(())
}

#[test]
fn test_sentinel_exit_codes_skip_without_mutation() -> Result<()> {
  for code in [20, 21] {
    let ws = TestWorkdir::with_success_producer()?;
    ws.cycle(T1, "1")?;
    ws.cycle(T2, "2")?;
    let before = ws.releases()?;

    ws.set_producer(&format!("exit {}", code))?;
    let output = ws.run(&["run", "--run-id", "3", "--revision", REVISION])?;

    assert!(output.status.success(), "exit {} should end the cycle successfully", code);
    assert!(stdout(&output).contains("No new data"));
    assert_eq!(ws.releases()?, before);
  }

  Ok(())
}

#[test]
fn test_unexpected_exit_code_is_fatal_without_mutation() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;
  ws.cycle(T1, "1")?;
  ws.cycle(T2, "2")?;
  let before = ws.releases()?;

  ws.set_producer("exit 7")?;
  let output = ws.run(&["run", "--run-id", "3", "--revision", REVISION])?;

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("exit code 7"), "{}", stderr(&output));
  assert_eq!(ws.releases()?, before);

  Ok(())
}

#[test]
fn test_success_without_outputs_is_packaging_error() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;
  ws.cycle(T1, "1")?;
  ws.cycle(T2, "2")?;
  let before = ws.releases()?;

  ws.set_producer("rm -f keywords dump\nprintf 'x' > categories\nexit 0")?;
  let output = ws.run(&["run", "--run-id", "3", "--revision", REVISION])?;

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("Packaging consistency error"), "{}", stderr(&output));
  assert_eq!(ws.releases()?, before);

  Ok(())
}

#[test]
fn test_same_revision_distinct_run_ids_get_distinct_tags() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;

  ws.cycle(T1, "500")?;
  ws.cycle(T2, "501")?;

  assert_eq!(
    ws.release_tags()?,
    vec!["9fceb02-500".to_string(), "9fceb02-501".to_string()]
  );

  Ok(())
}

#[test]
fn test_reused_run_id_fails_publication_and_deletes_nothing() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;
  ws.cycle(T1, "1")?;
  ws.cycle(T2, "2")?;
  let before = ws.releases()?;

  ws.stage_title(T3)?;
  let output = ws.run(&["run", "--run-id", "2", "--revision", REVISION])?;

  assert_eq!(output.status.code(), Some(2));
  assert!(stderr(&output).contains("already exists"), "{}", stderr(&output));
  assert_eq!(ws.releases()?, before);

  Ok(())
}

#[test]
fn test_dry_run_publishes_nothing() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;
  ws.cycle(T1, "1")?;
  ws.cycle(T2, "2")?;
  let before = ws.releases()?;

  ws.stage_title(T3)?;
  let output = ws.run(&["run", "--dry-run", "--run-id", "3", "--revision", REVISION])?;

  assert!(output.status.success(), "{}", stderr(&output));
  let out = stdout(&output);
  assert!(out.contains("Would publish 9fceb02-3"));
  assert!(out.contains("Would delete 9fceb02-1"));
  assert_eq!(ws.releases()?, before);
  assert!(ws.file_exists("data.tar.zst"));

  Ok(())
}

#[test]
fn test_json_report() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;
  ws.stage_title(T1)?;

  let output = ws.run(&["run", "--json", "--run-id", "9", "--revision", REVISION])?;
  assert!(output.status.success(), "{}", stderr(&output));

  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(json["outcome"], "published");
  assert_eq!(json["since"], "2025-04-04T01:00:00Z");
  assert_eq!(json["release"]["tag"], "9fceb02-9");
  assert_eq!(json["release"]["title"], T1);
  assert_eq!(json["artifact"]["sha256"].as_str().map(str::len), Some(64));
  assert_eq!(json["evicted"], serde_json::json!([]));

  Ok(())
}

#[test]
fn test_revision_defaults_to_checkout_head() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;
  git(&ws.path, &["init", "--initial-branch=main"])?;
  git(&ws.path, &["config", "user.name", "Test User"])?;
  git(&ws.path, &["config", "user.email", "test@example.com"])?;
  git(&ws.path, &["add", "cycle.toml", "producer.sh"])?;
  git(&ws.path, &["commit", "-m", "Initial setup"])?;
  let head = git(&ws.path, &["rev-parse", "HEAD"])?;
  let head = String::from_utf8_lossy(&head.stdout).trim().to_string();

  ws.stage_title(T1)?;
  let output = ws.run(&["run", "--run-id", "42"])?;
  assert!(output.status.success(), "{}", stderr(&output));

  assert_eq!(ws.release_tags()?, vec![format!("{}-42", &head[..7])]);

  Ok(())
}

#[test]
fn test_silent_success_after_a_publish_is_packaging_error() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;
  ws.cycle(T1, "1")?;
  let before = ws.releases()?;

  ws.set_producer("exit 0")?;
  let output = ws.run(&["run", "--run-id", "2", "--revision", REVISION])?;

  assert_eq!(output.status.code(), Some(3), "{}", stderr(&output));
  assert!(stderr(&output).contains("Packaging consistency error"), "{}", stderr(&output));
  assert_eq!(ws.releases()?, before);
  assert_eq!(ws.release_titles()?, vec![T1.to_string()]);
  assert!(!ws.file_exists("last_updated"));
  assert!(!ws.file_exists("data.tar.zst"));

  Ok(())
}

#[test]
fn test_blank_run_id_is_rejected_before_producing() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;
  ws.stage_title(T1)?;

  for run_id in ["", "  "] {
    let output = ws.run(&["run", "--run-id", run_id, "--revision", REVISION])?;
    assert_eq!(output.status.code(), Some(1), "{}", stderr(&output));
    assert!(stderr(&output).contains("Invalid run id"), "{}", stderr(&output));
  }

  assert!(ws.seen_since()?.is_empty());
  assert!(ws.releases()?.is_empty());

  Ok(())
}

#[test]
fn test_default_logging_is_quiet_and_plain() -> Result<()> {
  let ws = TestWorkdir::with_success_producer()?;

  let output = ws.cycle(T1, "1")?;
  let err = stderr(&output);
  assert!(!err.contains("INFO"), "{}", err);
  assert!(!err.contains('\u{1b}'), "{}", err);

  ws.stage_title(T2)?;
  let output = ws.run(&["--log-level", "info", "run", "--run-id", "2", "--revision", REVISION])?;
  let err = stderr(&output);
  assert!(err.contains("invoking producer"), "{}", err);
  assert!(!err.contains('\u{1b}'), "{}", err);

  Ok(())
}
