use crate::error::{Result, RunnerError};
use crate::registry::{self, FLAGS};

/// Value of a single command line flag.
///
/// `Bool(true)` emits the bare flag, `Bool(false)` omits it, anything else
/// emits the flag followed by the value.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
  Bool(bool),
  Text(String),
  Integer(i64),
  Float(f64),
}

impl FlagValue {
  /// Parse a literal as written in a Matrunfile or on the command line.
  ///
  /// `true`/`false` become booleans, double-quoted text has its quotes
  /// stripped, integer and float literals become numbers, and anything else
  /// is kept verbatim as text.
  pub fn parse_literal(raw: &str) -> Self {
    let trimmed = raw.trim();
    match trimmed {
      "true" => return FlagValue::Bool(true),
      "false" => return FlagValue::Bool(false),
      _ => {}
    }
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
      return FlagValue::Text(trimmed[1..trimmed.len() - 1].to_string());
    }
    if let Ok(n) = trimmed.parse::<i64>() {
      return FlagValue::Integer(n);
    }
    // Rust also accepts "inf" and "NaN" here, which are not MATLAB literals
    if let Ok(x) = trimmed.parse::<f64>() {
      if x.is_finite() {
        return FlagValue::Float(x);
      }
    }
    FlagValue::Text(trimmed.to_string())
  }

  pub fn is_active(&self) -> bool {
    !matches!(self, FlagValue::Bool(false))
  }
}

impl From<bool> for FlagValue {
  fn from(value: bool) -> Self {
    FlagValue::Bool(value)
  }
}

impl From<&str> for FlagValue {
  fn from(value: &str) -> Self {
    FlagValue::Text(value.to_string())
  }
}

impl From<String> for FlagValue {
  fn from(value: String) -> Self {
    FlagValue::Text(value)
  }
}

impl From<i32> for FlagValue {
  fn from(value: i32) -> Self {
    FlagValue::Integer(value.into())
  }
}

impl From<i64> for FlagValue {
  fn from(value: i64) -> Self {
    FlagValue::Integer(value)
  }
}

impl From<f64> for FlagValue {
  fn from(value: f64) -> Self {
    FlagValue::Float(value)
  }
}

/// Flag values of one runner, kept in registry order.
///
/// Only [`Options::merge`] can change a value, and it rejects names outside
/// the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
  values: Vec<(&'static str, FlagValue)>,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      values: FLAGS
        .iter()
        .map(|flag| (flag.name, registry::default_value()))
        .collect(),
    }
  }
}

impl Options {
  pub fn get(&self, name: &str) -> Option<&FlagValue> {
    self
      .values
      .iter()
      .find(|(key, _)| *key == name)
      .map(|(_, value)| value)
  }

  /// Iterate in registry order.
  pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FlagValue)> {
    self.values.iter().map(|(key, value)| (*key, value))
  }

  pub fn active(&self) -> impl Iterator<Item = (&'static str, &FlagValue)> {
    self.iter().filter(|(_, value)| value.is_active())
  }

  /// Overwrite the supplied flags, leaving every other flag as it was.
  ///
  /// All names are checked before anything is written: one unknown name
  /// rejects the whole update.
  pub fn merge<I, K>(&mut self, updates: I) -> Result<()>
  where
    I: IntoIterator<Item = (K, FlagValue)>,
    K: AsRef<str>,
  {
    let updates: Vec<(K, FlagValue)> = updates.into_iter().collect();

    let mut invalid: Vec<String> = Vec::new();
    for (key, _) in &updates {
      let key = key.as_ref();
      if !registry::is_valid(key) && !invalid.iter().any(|k| k == key) {
        invalid.push(key.to_string());
      }
    }
    if !invalid.is_empty() {
      return Err(RunnerError::invalid_option(invalid));
    }

    for (key, value) in updates {
      if let Some(slot) = self
        .values
        .iter_mut()
        .find(|(name, _)| *name == key.as_ref())
      {
        slot.1 = value;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_literal() {
    assert_eq!(FlagValue::parse_literal("true"), FlagValue::Bool(true));
    assert_eq!(FlagValue::parse_literal(" false "), FlagValue::Bool(false));
    assert_eq!(FlagValue::parse_literal("4444"), FlagValue::Integer(4444));
    assert_eq!(FlagValue::parse_literal("-3"), FlagValue::Integer(-3));
    assert_eq!(FlagValue::parse_literal("2.5"), FlagValue::Float(2.5));
    assert_eq!(
      FlagValue::parse_literal("\"/work dir\""),
      FlagValue::Text("/work dir".to_string())
    );
    assert_eq!(
      FlagValue::parse_literal("log.txt"),
      FlagValue::Text("log.txt".to_string())
    );
    assert_eq!(FlagValue::parse_literal("inf"), FlagValue::Text("inf".to_string()));
    assert_eq!(FlagValue::parse_literal("\"\""), FlagValue::Text(String::new()));
  }

  #[test]
  fn test_merge_is_cumulative() {
    let mut options = Options::default();
    options.merge([("nodesktop", true.into())]).unwrap();
    options.merge([("sd", "/work".into())]).unwrap();

    assert_eq!(options.get("nodesktop"), Some(&FlagValue::Bool(true)));
    assert_eq!(options.get("sd"), Some(&FlagValue::Text("/work".to_string())));
  }

  #[test]
  fn test_merge_later_value_wins() {
    let mut options = Options::default();
    options.merge([("sd", FlagValue::from("/a"))]).unwrap();
    options.merge([("sd", FlagValue::from("/b"))]).unwrap();
    assert_eq!(options.get("sd"), Some(&FlagValue::Text("/b".to_string())));
  }

  #[test]
  fn test_merge_rejects_without_partial_update() {
    let mut options = Options::default();
    let result = options.merge([
      ("nodesktop", FlagValue::Bool(true)),
      ("desktop", FlagValue::Bool(true)),
      ("splash", FlagValue::Bool(true)),
      ("desktop", FlagValue::Bool(false)),
    ]);

    match result {
      Err(RunnerError::InvalidOption { invalid, valid }) => {
        assert_eq!(invalid, vec!["desktop", "splash"]);
        assert_eq!(valid.len(), FLAGS.len());
      }
      other => panic!("expected InvalidOption, got {:?}", other),
    }
    assert_eq!(options, Options::default());
  }

  #[test]
  fn test_iter_follows_registry_order() {
    let mut options = Options::default();
    options
      .merge([("wait", FlagValue::Bool(true)), ("nodesktop", FlagValue::Bool(true))])
      .unwrap();
    let active: Vec<_> = options.active().map(|(name, _)| name).collect();
    assert_eq!(active, vec!["nodesktop", "wait"]);
  }
}
