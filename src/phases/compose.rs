/// Wraps a statement so a runtime error is printed instead of aborting.
pub const TRY_CATCH_TEMPLATE: &str =
  "try, {}, catch err, fprintf('%s %s', err.identifier, err.message), end";
/// Appends an exit so the process closes once the statement is done.
pub const EXIT_TEMPLATE: &str = "{}, exit";

pub const STATEMENT_SEPARATOR: &str = ", ";

/// MATLAB code to run, treated as opaque text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
  Single(String),
  Lines(Vec<String>),
}

impl Statement {
  pub fn joined(&self) -> String {
    match self {
      Statement::Single(line) => line.clone(),
      Statement::Lines(lines) => lines.join(STATEMENT_SEPARATOR),
    }
  }
}

impl From<&str> for Statement {
  fn from(line: &str) -> Self {
    Statement::Single(line.to_string())
  }
}

impl From<String> for Statement {
  fn from(line: String) -> Self {
    Statement::Single(line)
  }
}

impl From<Vec<String>> for Statement {
  fn from(lines: Vec<String>) -> Self {
    Statement::Lines(lines)
  }
}

impl From<Vec<&str>> for Statement {
  fn from(lines: Vec<&str>) -> Self {
    Statement::Lines(lines.into_iter().map(String::from).collect())
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunFlags {
  /// Run with `-batch` instead of `-r`.
  pub batch: bool,
  pub try_catch: bool,
  pub auto_exit: bool,
}

impl RunFlags {
  pub fn batch(mut self, batch: bool) -> Self {
    self.batch = batch;
    self
  }

  pub fn try_catch(mut self, try_catch: bool) -> Self {
    self.try_catch = try_catch;
    self
  }

  pub fn auto_exit(mut self, auto_exit: bool) -> Self {
    self.auto_exit = auto_exit;
    self
  }

  pub fn run_mode(&self) -> &'static str {
    if self.batch { "-batch" } else { "-r" }
  }
}

#[derive(Default)]
pub struct ComposePhase;

impl ComposePhase {
  pub fn new() -> Self {
    Self
  }

  /// Join and wrap the statement. The exit goes outside the try-catch so it
  /// always runs.
  pub fn compose_statement(&self, statement: &Statement, flags: &RunFlags) -> String {
    let mut body = statement.joined();
    if flags.try_catch {
      body = TRY_CATCH_TEMPLATE.replacen("{}", &body, 1);
    }
    if flags.auto_exit {
      body = EXIT_TEMPLATE.replacen("{}", &body, 1);
    }
    body
  }

  pub fn compose_command(&self, header: &str, statement: &Statement, flags: &RunFlags) -> String {
    format!(
      "{} {} \"{}\"",
      header,
      flags.run_mode(),
      self.compose_statement(statement, flags)
    )
  }
}
