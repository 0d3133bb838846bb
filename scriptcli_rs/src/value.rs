//! Typed values flowing through a command invocation.
//!
//! Script arguments arrive already typed (the terminal converts `true`,
//! `false` and numbers before a script sees them), so the parser works on
//! [`Value`] tokens. [`Value::infer`] performs that conversion for raw
//! strings coming straight from a shell line.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of an option or positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single typed token or option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Value {
    /// Convert a raw shell word into a typed value.
    ///
    /// `"true"`/`"false"` become booleans, anything that parses as a finite
    /// number becomes a number, the rest stays a string.
    pub fn infer(raw: &str) -> Value {
        match raw {
            "true" => return Value::Boolean(true),
            "false" => return Value::Boolean(false),
            _ => {}
        }
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() && !raw.trim().is_empty() => Value::Number(n),
            _ => Value::String(raw.to_string()),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Boolean(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
        }
    }

    pub fn is_type(&self, ty: ValueType) -> bool {
        self.value_type() == ty
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// True for string tokens that look like an option flag (`-x`, `--name`).
    pub fn is_flag_like(&self) -> bool {
        matches!(self, Value::String(s) if s.starts_with('-'))
    }

    /// Render for help text: strings quoted, everything else bare.
    pub fn quoted(&self) -> String {
        match self {
            Value::String(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

/// Infer every raw word of a shell line.
pub fn infer_all<S: AsRef<str>>(raw: &[S]) -> Vec<Value> {
    raw.iter().map(|s| Value::infer(s.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_booleans_and_numbers() {
        assert_eq!(Value::infer("true"), Value::Boolean(true));
        assert_eq!(Value::infer("false"), Value::Boolean(false));
        assert_eq!(Value::infer("2"), Value::Number(2.0));
        assert_eq!(Value::infer("-5"), Value::Number(-5.0));
        assert_eq!(Value::infer("1.5"), Value::Number(1.5));
    }

    #[test]
    fn test_infer_strings() {
        assert_eq!(Value::infer("-v"), Value::from("-v"));
        assert_eq!(Value::infer("inf"), Value::from("inf"));
        assert_eq!(Value::infer("NaN"), Value::from("NaN"));
        assert_eq!(Value::infer(""), Value::from(""));
        assert_eq!(Value::infer("True"), Value::from("True"));
    }

    #[test]
    fn test_flag_like_only_for_strings() {
        assert!(Value::from("--help").is_flag_like());
        assert!(Value::from("-t").is_flag_like());
        assert!(!Value::Number(-3.0).is_flag_like());
        assert!(!Value::from("file").is_flag_like());
    }

    #[test]
    fn test_quoted_rendering() {
        assert_eq!(Value::from("a").quoted(), "'a'");
        assert_eq!(Value::Number(3.0).quoted(), "3");
        assert_eq!(Value::Boolean(true).quoted(), "true");
    }
}
