use thiserror::Error;

/// Failures that abort a magnetostatic computation.
#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or inconsistent input parameters.
  #[error("invalid configuration: {0}")]
  Configuration(String),

  /// An operation was invoked in a state where it is not defined.
  #[error("invariant violated: {0}")]
  InvariantViolation(String),

  /// A factorization or conversion failed numerically.
  #[error("numerical failure: {0}")]
  Numerical(String),
}

impl Error {
  pub fn configuration(msg: impl Into<String>) -> Self {
    Self::Configuration(msg.into())
  }
  pub fn invariant(msg: impl Into<String>) -> Self {
    Self::InvariantViolation(msg.into())
  }

  pub fn is_configuration(&self) -> bool {
    matches!(self, Self::Configuration(_))
  }
  pub fn is_invariant_violation(&self) -> bool {
    matches!(self, Self::InvariantViolation(_))
  }
}

pub type Result<T> = std::result::Result<T, Error>;
