use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use ansi_term::Colour;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use matrun::config::{self, Config};
use matrun::registry::FLAGS;
use matrun::{ExecutionOptions, FlagValue, MatlabRunner, OutputMode, RunFlags, Statement};

/// Run MATLAB statements from the command line.
#[derive(Parser, Debug)]
#[command(name = "matrun", version)]
struct Cli {
  /// MATLAB executable, overrides `exe` from the Matrunfile
  #[arg(short, long, env = "MATRUN_EXE")]
  exe: Option<String>,

  /// Flag to pass to MATLAB, as NAME or NAME=VALUE (repeatable)
  #[arg(short = 'o', long = "option", value_name = "NAME[=VALUE]", value_parser = parse_flag)]
  options: Vec<(String, FlagValue)>,

  /// Run with -batch instead of -r
  #[arg(long)]
  batch: bool,

  /// Print MATLAB errors instead of stopping on them
  #[arg(long)]
  try_catch: bool,

  /// Exit MATLAB once the statements finish
  #[arg(long)]
  auto_exit: bool,

  /// Working directory for the MATLAB process
  #[arg(short = 'C', long, value_name = "DIR")]
  cwd: Option<PathBuf>,

  /// Extra environment variable, as KEY=VALUE (repeatable)
  #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env)]
  env: Vec<(String, String)>,

  /// Kill MATLAB after this many seconds
  #[arg(long, value_name = "SECS")]
  timeout: Option<f64>,

  /// Capture MATLAB output and print it when the process exits
  #[arg(long)]
  capture: bool,

  /// Read settings from this file instead of searching for a Matrunfile
  #[arg(long, value_name = "FILE", conflicts_with = "no_config")]
  config: Option<PathBuf>,

  /// Do not search for a Matrunfile
  #[arg(long)]
  no_config: bool,

  /// Print the command instead of running it
  #[arg(long)]
  dry_run: bool,

  /// List the flags MATLAB accepts
  #[arg(long)]
  list_flags: bool,

  #[arg(long)]
  no_color: bool,

  #[arg(short, long)]
  verbose: bool,

  /// Statements to run, joined with ", "
  statements: Vec<String>,
}

fn parse_flag(raw: &str) -> Result<(String, FlagValue), String> {
  match raw.split_once('=') {
    Some((name, value)) if !name.is_empty() => Ok((name.to_string(), FlagValue::parse_literal(value))),
    Some(_) => Err(format!("missing flag name in '{}'", raw)),
    None => Ok((raw.to_string(), FlagValue::Bool(true))),
  }
}

fn parse_env(raw: &str) -> Result<(String, String), String> {
  match raw.split_once('=') {
    Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
    _ => Err(format!("expected KEY=VALUE, found '{}'", raw)),
  }
}

fn init_logging(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
    )
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn list_flags(colors: bool) -> Result<()> {
  let width = FLAGS.iter().map(|flag| flag.name.len()).max().unwrap_or(0) + 1;
  let mut output = std::io::stdout().lock();
  for flag in FLAGS {
    let padding = " ".repeat(width - flag.name.len());
    let description = format!(" # {}", flag.description);
    if colors {
      writeln!(output, "-{}{}{}", flag.name, padding, Colour::Fixed(8).paint(description))?;
    } else {
      writeln!(output, "-{}{}{}", flag.name, padding, description)?;
    }
  }
  Ok(())
}

fn load_config(cli: &Cli) -> Result<Option<Config>> {
  if cli.no_config {
    return Ok(None);
  }
  let path = match &cli.config {
    Some(path) => Some(path.clone()),
    None => config::find_config()?,
  };
  match path {
    Some(path) => {
      tracing::debug!(path = %path.display(), "loading config");
      Ok(Some(Config::load(&path)?))
    }
    None => Ok(None),
  }
}

fn build_runner(cli: &Cli) -> Result<MatlabRunner> {
  let mut runner = MatlabRunner::new("matlab");
  if let Some(config) = load_config(cli)? {
    config.apply(&mut runner)?;
  }
  if let Some(exe) = &cli.exe {
    runner.set_exe_path(exe.clone());
  }
  runner
    .set_options(cli.options.iter().map(|(name, value)| (name.as_str(), value.clone())))
    .context("Invalid --option")?;
  Ok(runner)
}

fn statement(cli: &Cli) -> Statement {
  match cli.statements.as_slice() {
    [single] => Statement::Single(single.clone()),
    lines => Statement::Lines(lines.to_vec()),
  }
}

fn run_flags(cli: &Cli) -> RunFlags {
  RunFlags::default()
    .batch(cli.batch)
    .try_catch(cli.try_catch)
    .auto_exit(cli.auto_exit)
}

fn dry_run(cli: &Cli) -> Result<String> {
  let runner = build_runner(cli)?;
  Ok(runner.build_command(&statement(cli), &run_flags(cli))?)
}

/// The child's own code, or 1 when it was killed by a signal or is out of range.
fn exit_code(code: Option<i32>) -> u8 {
  code.and_then(|code| u8::try_from(code).ok()).unwrap_or(1)
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  if cli.list_flags {
    list_flags(!cli.no_color)?;
    return Ok(ExitCode::SUCCESS);
  }

  if cli.statements.is_empty() {
    return Err(anyhow!("No statement given. Pass one or more MATLAB statements to run"));
  }

  if cli.dry_run {
    println!("{}", dry_run(&cli)?);
    return Ok(ExitCode::SUCCESS);
  }

  let runner = build_runner(&cli)?;
  let mut execution = ExecutionOptions::new();
  if let Some(dir) = &cli.cwd {
    execution = execution.cwd(dir);
  }
  for (key, value) in &cli.env {
    execution = execution.env(key, value);
  }
  if let Some(secs) = cli.timeout {
    let timeout = Duration::try_from_secs_f64(secs).map_err(|_| anyhow!("Invalid --timeout: {}", secs))?;
    execution = execution.timeout(timeout);
  }
  if cli.capture {
    execution = execution.output(OutputMode::Capture);
  }

  let result = runner.execute(statement(&cli), run_flags(&cli), &execution)?;
  if let Some(stdout) = &result.stdout {
    std::io::stdout().write_all(stdout)?;
  }
  if let Some(stderr) = &result.stderr {
    std::io::stderr().write_all(stderr)?;
  }

  Ok(ExitCode::from(exit_code(result.code())))
}
