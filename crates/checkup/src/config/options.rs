//! Loosely typed option and argument maps with checked accessors.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Key/value configuration of a check (`Options`) or of a test (`Arguments`).
///
/// Values keep whatever JSON type the configuration used; the accessors
/// below turn a wrong type into a [`ConfigError`] at init time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(Map<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn require_str(&self, key: &str) -> Result<&str, ConfigError> {
        self.optional_str(key)?.ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    pub fn optional_str(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(wrong_type(key, "a string")),
        }
    }

    pub fn require_number(&self, key: &str) -> Result<f64, ConfigError> {
        match self.get(key) {
            None => Err(ConfigError::Missing(key.to_string())),
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| wrong_type(key, "a number")),
            Some(_) => Err(wrong_type(key, "a number")),
        }
    }

    /// An object whose values are all strings, e.g. HTTP headers.
    pub fn string_map(&self, key: &str) -> Result<BTreeMap<String, String>, ConfigError> {
        let object = match self.get(key) {
            None => return Ok(BTreeMap::new()),
            Some(Value::Object(object)) => object,
            Some(_) => return Err(wrong_type(key, "an object")),
        };
        object
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k.clone(), s.clone())),
                _ => Err(wrong_type(&format!("{key}.{k}"), "a string")),
            })
            .collect()
    }

    /// A duration written like `"30s"` or `"1m 30s"`.
    pub fn duration(&self, key: &str) -> Result<Option<Duration>, ConfigError> {
        self.optional_str(key)?.map(parse_duration).transpose()
    }
}

fn wrong_type(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::WrongType { field: key.to_string(), expected }
}

/// Parse a human duration; zero is rejected since nothing could be scheduled
/// or waited on with it.
pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    let duration = humantime::parse_duration(value.trim()).map_err(|e| ConfigError::Interval {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if duration.is_zero() {
        return Err(ConfigError::Interval {
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(duration)
}
