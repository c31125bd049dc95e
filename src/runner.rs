use std::path::Path;

use tracing::debug;

use crate::error::{Result, RunnerError};
use crate::options::{FlagValue, Options};
use crate::phases::compose::{RunFlags, Statement};
use crate::phases::invoke::{ExecutionOptions, ExecutionResult};
use crate::phases::{ComposePhase, HeaderPhase, InvokePhase};

/// Runs statements through one MATLAB executable with a stored set of flags.
///
/// The executable path is only checked when a statement is executed, so a
/// runner can be set up before MATLAB is installed.
pub struct MatlabRunner {
  exe_path: String,
  options: Options,
  header: HeaderPhase,
  compose: ComposePhase,
  invoke: InvokePhase,
}

impl MatlabRunner {
  pub fn new(exe_path: impl Into<String>) -> Self {
    Self {
      exe_path: exe_path.into(),
      options: Options::default(),
      header: HeaderPhase::new(),
      compose: ComposePhase::new(),
      invoke: InvokePhase::new(),
    }
  }

  pub fn with_options<I, K>(exe_path: impl Into<String>, options: I) -> Result<Self>
  where
    I: IntoIterator<Item = (K, FlagValue)>,
    K: AsRef<str>,
  {
    let mut runner = Self::new(exe_path);
    runner.set_options(options)?;
    Ok(runner)
  }

  pub fn exe_path(&self) -> &str {
    &self.exe_path
  }

  pub fn set_exe_path(&mut self, exe_path: impl Into<String>) {
    self.exe_path = exe_path.into();
  }

  pub fn options(&self) -> &Options {
    &self.options
  }

  /// Merge flags into the stored ones. Flags not mentioned keep their value.
  pub fn set_options<I, K>(&mut self, options: I) -> Result<()>
  where
    I: IntoIterator<Item = (K, FlagValue)>,
    K: AsRef<str>,
  {
    self.options.merge(options)?;
    debug!(options = ?self.options.active().collect::<Vec<_>>(), "options updated");
    Ok(())
  }

  pub fn build_options_string(&self) -> Result<String> {
    self.header.build_options_string(&self.options)
  }

  pub fn build_command_header(&self) -> Result<String> {
    self.header.build_command_header(&self.exe_path, &self.options)
  }

  /// The full command line `execute` would run, without touching the filesystem.
  pub fn build_command(&self, statement: &Statement, flags: &RunFlags) -> Result<String> {
    let header = self.build_command_header()?;
    Ok(self.compose.compose_command(&header, statement, flags))
  }

  pub fn execute(
    &self,
    statement: impl Into<Statement>,
    flags: RunFlags,
    execution: &ExecutionOptions,
  ) -> Result<ExecutionResult> {
    self.assert_exe_exists()?;

    let command = self.build_command(&statement.into(), &flags)?;
    debug!(command = %command, "composed command");

    self.invoke.invoke(&command, execution)
  }

  fn assert_exe_exists(&self) -> Result<()> {
    if !Path::new(&self.exe_path).is_file() {
      return Err(RunnerError::ExecutableNotFound {
        path: self.exe_path.clone(),
      });
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_construct_does_not_check_path() {
    let runner = MatlabRunner::new("/definitely/not/here/matlab");
    assert_eq!(runner.exe_path(), "/definitely/not/here/matlab");
    assert_eq!(runner.build_options_string().unwrap(), "");
  }

  #[test]
  fn test_with_options_rejects_unknown_flags() {
    let result = MatlabRunner::with_options(
      "/bin/tool",
      [("nodesktop", FlagValue::Bool(true)), ("desktop", FlagValue::Bool(true))],
    );
    let err = result.err().expect("unknown flag should be rejected");
    assert!(err.to_string().contains("[desktop]"));
  }

  #[test]
  fn test_set_options_is_cumulative() {
    let mut runner = MatlabRunner::new("/bin/tool");
    runner.set_options([("nodesktop", FlagValue::Bool(true))]).unwrap();
    runner.set_options([("nosplash", FlagValue::Bool(true))]).unwrap();
    runner.set_options([("nodesktop", FlagValue::Bool(false))]).unwrap();
    assert_eq!(runner.build_options_string().unwrap(), "-nosplash");
  }

  #[test]
  fn test_failed_set_options_keeps_previous_flags() {
    let mut runner = MatlabRunner::new("/bin/tool");
    runner.set_options([("nosplash", FlagValue::Bool(true))]).unwrap();
    let result = runner.set_options([("sd", FlagValue::from("/x")), ("bad", FlagValue::Bool(true))]);
    assert!(result.is_err());
    assert_eq!(runner.build_options_string().unwrap(), "-nosplash");
  }

  #[test]
  fn test_build_command_example() {
    let runner = MatlabRunner::with_options(
      "/bin/tool",
      [("sd", FlagValue::from("/work")), ("nodesktop", FlagValue::Bool(true))],
    )
    .unwrap();
    let command = runner
      .build_command(&"run".into(), &RunFlags::default())
      .unwrap();
    assert_eq!(command, "/bin/tool -nodesktop -sd \"/work\" -r \"run\"");
  }

  #[test]
  fn test_set_exe_path_changes_header() {
    let mut runner = MatlabRunner::new("/old/matlab");
    runner.set_exe_path("/new/matlab");
    assert_eq!(runner.build_command_header().unwrap(), "/new/matlab ");
  }

  #[test]
  fn test_execute_missing_exe() {
    let temp_dir = TempDir::new().unwrap();
    let marker = temp_dir.path().join("invoked");
    let runner = MatlabRunner::new(temp_dir.path().join("matlab").to_string_lossy());

    // If the shell were reached, this would create the marker file
    let execution = ExecutionOptions::new().shell(crate::phases::invoke::Shell::new("touch", marker.to_string_lossy()));
    let result = runner.execute("disp(1)", RunFlags::default(), &execution);

    assert!(matches!(result, Err(RunnerError::ExecutableNotFound { .. })));
    assert!(!marker.exists());
  }

  #[test]
  fn test_execute_directory_is_not_an_executable() {
    let temp_dir = TempDir::new().unwrap();
    let runner = MatlabRunner::new(temp_dir.path().to_string_lossy());
    let result = runner.execute("disp(1)", RunFlags::default(), &ExecutionOptions::new());
    assert!(result.unwrap_err().to_string().contains("does not exist"));
  }
}
