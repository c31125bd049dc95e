//! Build and run MATLAB command lines.
//!
//! A [`MatlabRunner`] holds the executable path and its command line flags,
//! and turns statements into a single command such as
//! `matlab -nodesktop -sd "/work" -r "try, run, catch err, ..., end, exit"`.

pub mod config;
pub mod error;
pub mod options;
pub mod phases;
pub mod registry;
pub mod runner;

pub use crate::config::Config;
pub use crate::error::{Result, RunnerError};
pub use crate::options::{FlagValue, Options};
pub use crate::phases::compose::{RunFlags, Statement};
pub use crate::phases::invoke::{ExecutionOptions, ExecutionResult, OutputMode, Shell};
pub use crate::runner::MatlabRunner;

/// Build the command line for `statement` without running it.
pub fn build_command<I, K>(
  exe_path: &str,
  options: I,
  statement: impl Into<Statement>,
  flags: RunFlags,
) -> Result<String>
where
  I: IntoIterator<Item = (K, FlagValue)>,
  K: AsRef<str>,
{
  let runner = MatlabRunner::with_options(exe_path, options)?;
  runner.build_command(&statement.into(), &flags)
}
