use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RunnerError>;

#[derive(Debug, Error)]
pub enum RunnerError {
  #[error("Invalid options: [{}]. Valid flags are ({})", .invalid.join(", "), .valid.join(", "))]
  InvalidOption {
    invalid: Vec<String>,
    valid: Vec<&'static str>,
  },
  #[error("Value for flag '{flag}' is not a valid number or string")]
  InvalidValue { flag: String },
  #[error("MATLAB executable at {path} does not exist")]
  ExecutableNotFound { path: String },
  #[error("Failed to invoke command: {0}")]
  Invocation(#[from] std::io::Error),
  #[error("Command timed out after {timeout:?}: {command}")]
  TimedOut { command: String, timeout: Duration },
}

impl RunnerError {
  pub(crate) fn invalid_option<I, S>(invalid: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::InvalidOption {
      invalid: invalid.into_iter().map(Into::into).collect(),
      valid: crate::registry::names(),
    }
  }
}
