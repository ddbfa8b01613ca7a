//! Outcome classification for mutating exchange calls.

use thiserror::Error;

/// Failure of a place or cancel call.
///
/// Only `Rejected` is a definite answer. A timeout or transport failure
/// may or may not have reached the matching engine.
#[derive(Debug, Error)]
pub enum OperationError {
  #[error("operation timed out")]
  Timeout,
  #[error("rejected by exchange: {0}")]
  Rejected(String),
  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl OperationError {
  /// True when the exchange definitely did not apply the operation.
  pub const fn is_definite(&self) -> bool {
    matches!(self, Self::Rejected(_))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_only_rejections_are_definite() {
    assert!(OperationError::Rejected("bad price".into()).is_definite());
    assert!(!OperationError::Timeout.is_definite());
    assert!(!OperationError::from(anyhow::anyhow!("reset by peer")).is_definite());
  }
}
