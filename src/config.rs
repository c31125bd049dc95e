use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use regex::Regex;

use crate::options::FlagValue;
use crate::runner::MatlabRunner;

pub const CONFIG_FILE_NAME: &str = "Matrunfile";

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*)$").expect("assignment pattern is valid")
});

/// Settings read from a Matrunfile.
///
/// ```text
/// # comment
/// exe = "/usr/local/MATLAB/R2023b/bin/matlab"
/// nodesktop = true
/// sd = "/work"
/// ```
///
/// Comments must be on their own line. An unquoted value containing ` #` is
/// rejected instead of being read as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
  pub exe: Option<String>,
  /// Flags in file order. Names are checked when applied to a runner.
  pub options: Vec<(String, FlagValue)>,
}

impl Config {
  pub fn parse(content: &str) -> Result<Self> {
    let mut config = Config::default();

    for (index, line) in content.lines().enumerate() {
      let trimmed = line.trim();
      if trimmed.is_empty() || trimmed.starts_with('#') {
        continue;
      }

      let captures = ASSIGNMENT
        .captures(trimmed)
        .ok_or_else(|| anyhow!("Line {}: expected `name = value`, found '{}'", index + 1, trimmed))?;
      let key = &captures[1];
      let raw = captures[2].trim();
      if raw.is_empty() {
        return Err(anyhow!("Line {}: missing value for '{}'", index + 1, key));
      }
      let quoted = raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"');
      if !quoted && raw.contains(" #") {
        return Err(anyhow!(
          "Line {}: inline comments are not supported, quote the value of '{}' or move the comment to its own line",
          index + 1,
          key
        ));
      }

      if key == "exe" {
        config.exe = Some(match FlagValue::parse_literal(raw) {
          FlagValue::Text(text) => text,
          _ => raw.to_string(),
        });
      } else {
        config.options.push((key.to_string(), FlagValue::parse_literal(raw)));
      }
    }

    Ok(config)
  }

  pub fn load(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path)
      .with_context(|| format!("Could not read {}", path.display()))?;
    Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
  }

  /// Merge this config's flags into `runner`, and its `exe` if one is set.
  pub fn apply(&self, runner: &mut MatlabRunner) -> Result<()> {
    if let Some(exe) = &self.exe {
      runner.set_exe_path(exe.clone());
    }
    runner.set_options(self.options.iter().map(|(key, value)| (key.as_str(), value.clone())))?;
    Ok(())
  }
}

/// Find a Matrunfile in `start` or the nearest parent directory.
pub fn find_config_from(start: &Path) -> Option<PathBuf> {
  let mut current_dir = start.to_path_buf();

  loop {
    let config_path = current_dir.join(CONFIG_FILE_NAME);
    if config_path.is_file() {
      return Some(config_path);
    }

    if let Some(parent) = current_dir.parent() {
      current_dir = parent.to_path_buf();
    } else {
      return None;
    }
  }
}

pub fn find_config() -> Result<Option<PathBuf>> {
  let current_dir = std::env::current_dir()?;
  Ok(find_config_from(&current_dir))
}
