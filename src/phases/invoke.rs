use std::{
  io::{self, Read},
  path::PathBuf,
  process::{Child, Command as ProcessCommand, ExitStatus, Stdio},
  thread::{self, JoinHandle},
  time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::error::{Result, RunnerError};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

type CapturedOutput = (ExitStatus, Option<Vec<u8>>, Option<Vec<u8>>);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
  #[default]
  Inherit,
  Capture,
}

/// Program that receives the composed command line as a single argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shell {
  pub program: String,
  pub flag: String,
}

impl Shell {
  pub fn new(program: impl Into<String>, flag: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      flag: flag.into(),
    }
  }
}

/// Settings handed straight to the child process.
#[derive(Clone, Debug, Default)]
pub struct ExecutionOptions {
  pub cwd: Option<PathBuf>,
  pub env: Vec<(String, String)>,
  pub env_clear: bool,
  pub output: OutputMode,
  pub timeout: Option<Duration>,
  pub shell: Option<Shell>,
}

impl ExecutionOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.push((key.into(), value.into()));
    self
  }

  /// Start the child with an empty environment; `env` entries still apply.
  pub fn env_clear(mut self) -> Self {
    self.env_clear = true;
    self
  }

  pub fn output(mut self, output: OutputMode) -> Self {
    self.output = output;
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  pub fn shell(mut self, shell: Shell) -> Self {
    self.shell = Some(shell);
    self
  }
}

#[derive(Debug)]
pub struct ExecutionResult {
  pub command: String,
  pub status: ExitStatus,
  pub stdout: Option<Vec<u8>>,
  pub stderr: Option<Vec<u8>>,
}

impl ExecutionResult {
  pub fn success(&self) -> bool {
    self.status.success()
  }

  pub fn code(&self) -> Option<i32> {
    self.status.code()
  }

  pub fn stdout_lossy(&self) -> Option<String> {
    self
      .stdout
      .as_ref()
      .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
  }

  pub fn stderr_lossy(&self) -> Option<String> {
    self
      .stderr
      .as_ref()
      .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
  }
}

#[derive(Default)]
pub struct InvokePhase;

impl InvokePhase {
  pub fn new() -> Self {
    Self
  }

  /// Run `command` through the shell and block until it finishes.
  ///
  /// A non-zero exit status is reported in the result, not as an error.
  pub fn invoke(&self, command: &str, options: &ExecutionOptions) -> Result<ExecutionResult> {
    let mut cmd = self.shell_command(command, options.shell.as_ref());

    if let Some(dir) = &options.cwd {
      cmd.current_dir(dir);
    }
    if options.env_clear {
      cmd.env_clear();
    }
    for (key, value) in &options.env {
      cmd.env(key, value);
    }
    match options.output {
      OutputMode::Inherit => {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
      }
      OutputMode::Capture => {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
      }
    }

    if options.timeout.is_some() {
      isolate_process_group(&mut cmd);
    }

    info!(command, "launching");
    let child = cmd.spawn()?;

    let (status, stdout, stderr) = match (options.timeout, options.output) {
      (Some(timeout), _) => self.wait_with_timeout(child, command, timeout)?,
      (None, OutputMode::Inherit) => {
        let mut child = child;
        (child.wait()?, None, None)
      }
      (None, OutputMode::Capture) => {
        let output = child.wait_with_output()?;
        (output.status, Some(output.stdout), Some(output.stderr))
      }
    };
    debug!(code = ?status.code(), "process exited");

    Ok(ExecutionResult {
      command: command.to_string(),
      status,
      stdout,
      stderr,
    })
  }

  fn shell_command(&self, command: &str, shell: Option<&Shell>) -> ProcessCommand {
    match shell {
      Some(shell) => {
        let mut cmd = ProcessCommand::new(&shell.program);
        cmd.arg(&shell.flag).arg(command);
        cmd
      }
      None => platform_command(command),
    }
  }

  fn wait_with_timeout(&self, mut child: Child, command: &str, timeout: Duration) -> Result<CapturedOutput> {
    // Drain pipes while polling so a chatty child cannot fill them and stall
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let deadline = Instant::now() + timeout;

    loop {
      if let Some(status) = child.try_wait()? {
        return Ok((status, collect(stdout)?, collect(stderr)?));
      }
      if Instant::now() >= deadline {
        warn!(command, ?timeout, "timed out, killing process");
        kill_tree(&mut child)?;
        child.wait()?;
        return Err(RunnerError::TimedOut {
          command: command.to_string(),
          timeout,
        });
      }
      thread::sleep(POLL_INTERVAL);
    }
  }
}

/// Only for timed runs: a separate group loses the controlling terminal.
#[cfg(unix)]
fn isolate_process_group(cmd: &mut ProcessCommand) {
  use std::os::unix::process::CommandExt;

  cmd.process_group(0);
}

#[cfg(not(unix))]
fn isolate_process_group(_cmd: &mut ProcessCommand) {}

/// Kill the child and everything it started. MATLAB launchers are wrapper
/// scripts, so killing only the shell leaves MATLAB running.
#[cfg(unix)]
fn kill_tree(child: &mut Child) -> io::Result<()> {
  use nix::errno::Errno;
  use nix::sys::signal::{Signal, killpg};
  use nix::unistd::Pid;

  let pgid = i32::try_from(child.id()).map_err(io::Error::other)?;
  match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
    // Group already gone; reap the child below
    Ok(()) | Err(Errno::ESRCH) => Ok(()),
    Err(errno) => Err(errno.into()),
  }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) -> io::Result<()> {
  child.kill()
}

#[cfg(windows)]
fn platform_command(command: &str) -> ProcessCommand {
  use std::os::windows::process::CommandExt;

  // /S strips the outer quotes and runs the rest exactly as written
  let mut cmd = ProcessCommand::new("cmd");
  cmd.raw_arg(format!("/S /C \"{}\"", command));
  cmd
}

#[cfg(not(windows))]
fn platform_command(command: &str) -> ProcessCommand {
  let mut cmd = ProcessCommand::new("sh");
  cmd.arg("-c").arg(command);
  cmd
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<io::Result<Vec<u8>>> {
  thread::spawn(move || {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    Ok(buffer)
  })
}

fn collect(handle: Option<JoinHandle<io::Result<Vec<u8>>>>) -> Result<Option<Vec<u8>>> {
  match handle {
    Some(handle) => {
      let bytes = handle
        .join()
        .map_err(|_| io::Error::other("output reader thread panicked"))??;
      Ok(Some(bytes))
    }
    None => Ok(None),
  }
}
