//! Command arguments.

use serde_json::{Map, Value};

use crate::error::{BotwireError, Result};

/// The `args` object of a command. Absent `args` is an empty mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Map<String, Value>);

impl Args {
    /// Empty arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a decoded JSON object.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// True if `key` is present, even with a `null` value.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Required keys that are not present, in `required` order.
    pub fn missing(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|key| !self.contains(key))
            .map(|key| key.to_string())
            .collect()
    }

    /// A string argument of `command`.
    pub fn string(&self, command: &str, key: &str) -> Result<String> {
        match self.0.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(BotwireError::invalid_argument(command, key, "a string")),
        }
    }

    /// A numeric argument of `command`.
    pub fn number(&self, command: &str, key: &str) -> Result<f64> {
        self.0
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| BotwireError::invalid_argument(command, key, "a number"))
    }

    /// A non-negative duration in milliseconds; fractional values are rounded.
    pub fn millis(&self, command: &str, key: &str) -> Result<u64> {
        let value = self.0.get(key);
        value
            .and_then(Value::as_u64)
            .or_else(|| {
                value
                    .and_then(Value::as_f64)
                    .filter(|ms| ms.is_finite() && *ms >= 0.0)
                    .map(|ms| ms.round() as u64)
            })
            .ok_or_else(|| {
                BotwireError::invalid_argument(command, key, "a non-negative number of milliseconds")
            })
    }
}

impl From<Map<String, Value>> for Args {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
