use crate::error::{Result, RunnerError};
use crate::options::{FlagValue, Options};
use crate::registry;

/// Builds `<exe> <flags>`, the part of the command shared by every statement.
#[derive(Default)]
pub struct HeaderPhase;

impl HeaderPhase {
  pub fn new() -> Self {
    Self
  }

  /// Render one flag, or `None` when the flag is switched off.
  pub fn build_flag_token(&self, name: &str, value: &FlagValue) -> Result<Option<String>> {
    if !registry::is_valid(name) {
      return Err(RunnerError::invalid_option([name]));
    }

    let token = match value {
      FlagValue::Bool(false) => None,
      FlagValue::Bool(true) => Some(format!("-{}", name)),
      // No escaping: embedded quotes are the caller's business
      FlagValue::Text(text) => Some(format!("-{} \"{}\"", name, text)),
      FlagValue::Integer(n) => Some(format!("-{} {}", name, n)),
      FlagValue::Float(x) => {
        if !x.is_finite() {
          return Err(RunnerError::InvalidValue {
            flag: name.to_string(),
          });
        }
        Some(format!("-{} {}", name, float_literal(*x)))
      }
    };
    Ok(token)
  }

  pub fn build_options_string(&self, options: &Options) -> Result<String> {
    let mut tokens = Vec::new();
    for (name, value) in options.iter() {
      if let Some(token) = self.build_flag_token(name, value)? {
        tokens.push(token);
      }
    }
    Ok(tokens.join(" "))
  }

  pub fn build_command_header(&self, exe_path: &str, options: &Options) -> Result<String> {
    Ok(format!("{} {}", exe_path, self.build_options_string(options)?))
  }
}

/// Render a finite float as `1.0`, `2.5`, `1e+20` or `1e-05`.
///
/// Debug output keeps the decimal point on whole numbers and uses an exponent
/// below 1e-4 and from 1e16 up. The exponent gets a sign and two digits.
fn float_literal(x: f64) -> String {
  let debug = format!("{:?}", x);
  match debug.split_once('e') {
    Some((mantissa, exponent)) => {
      let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
      };
      format!("{}e{}{:0>2}", mantissa, sign, digits)
    }
    None => debug,
  }
}
