//! Credential wrapper that never prints its contents

use std::fmt;

/// Authentication token for the release store
///
/// Handed explicitly to the store constructor. `Debug` and `Display` both
/// print `[REDACTED]`, so a token can sit inside structs that get logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  /// Raw value, for handing to a subprocess environment only
  pub fn expose(&self) -> &str {
    &self.0
  }

  /// Replace every occurrence of the token in `text`
  pub fn scrub(&self, text: &str) -> String {
    if self.0.is_empty() {
      return text.to_string();
    }
    text.replace(&self.0, "[REDACTED]")
  }
}

impl fmt::Debug for Secret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Secret([REDACTED])")
  }
}

impl fmt::Display for Secret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("[REDACTED]")
  }
}
