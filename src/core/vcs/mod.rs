pub mod system_git;

pub use system_git::SystemGit;

/// Length of the abbreviated revision used in release tags
pub const SHORT_SHA_LEN: usize = 7;

/// Abbreviate a revision for use in a release tag
///
/// Revisions shorter than [`SHORT_SHA_LEN`] are returned unchanged.
pub fn short_revision(sha: &str) -> &str {
  let sha = sha.trim();
  match sha.char_indices().nth(SHORT_SHA_LEN) {
    Some((idx, _)) => &sha[..idx],
    None => sha,
  }
}
