//! Per-node middleware configuration.
//!
//! A [`MiddlewareConfig`] is an open key/value bag. Which keys matter
//! depends on the kind of the owning node; handlers read what they
//! recognize and fall back to their own defaults for anything missing.

use crate::error::DaedalusError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Loosely-typed configuration for one middleware node.
///
/// Serializes as a plain JSON object. Key order is preserved so that a
/// document survives an import/export cycle unchanged.
///
/// # Example
///
/// ```
/// use daedalus_core::MiddlewareConfig;
///
/// let config = MiddlewareConfig::new()
///     .with("permitLimit", 3)
///     .with("policyName", "api");
///
/// assert_eq!(config.u64_or("permitLimit", 100), 3);
/// assert_eq!(config.str_or("policyName", "default"), "api");
/// assert_eq!(config.u64_or("window", 60), 60);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MiddlewareConfig(Map<String, Value>);

impl MiddlewareConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a key, returning the updated configuration.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Removes a key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Returns the raw value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns true if no keys are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a string value, if the key holds a string.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns a string value, or `default` when missing or not a string.
    #[must_use]
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.str(key).unwrap_or(default)
    }

    /// Returns a list of strings.
    ///
    /// Accepts either a JSON array (non-string items are skipped) or a
    /// comma-separated string. Missing keys yield an empty list.
    #[must_use]
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns an unsigned integer, or `default`.
    ///
    /// Numeric strings are accepted, since editors often store numbers
    /// typed into text fields as strings.
    #[must_use]
    pub fn u64_or(&self, key: &str, default: u64) -> u64 {
        match self.0.get(key) {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Returns a boolean, or `default`.
    #[must_use]
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => default,
            },
            _ => default,
        }
    }

    /// Fills in every key of `defaults` that is missing here.
    pub fn merge_defaults(&mut self, defaults: &MiddlewareConfig) {
        for (key, value) in &defaults.0 {
            if !self.0.contains_key(key) {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }

    /// Iterates over the key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the underlying JSON map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for MiddlewareConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for MiddlewareConfig {
    type Error = DaedalusError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(DaedalusError::invalid_config(
                "config",
                format!("expected a JSON object, found {other}"),
            )),
        }
    }
}
