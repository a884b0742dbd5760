//! Canonical cache key construction
//!
//! Keys have the shape `<family>:<user>:<params>`. The family and user
//! segments are percent-escaped so `:` never appears inside them, which makes
//! `<family>:<user>:` an unambiguous prefix for family invalidation. Params
//! are rendered as a JSON object with sorted keys.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// User scope used when no authenticated user is known
pub const ANONYMOUS_USER: &str = "anonymous";

const DELIMITER: char = ':';

/// Logical resource a cached value belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceFamily {
    /// Filtered expense listings
    ExpenseList,
    /// A single expense by id
    Expense,
    /// Monthly or yearly aggregates
    Report,
    Other(String),
}

impl ResourceFamily {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceFamily::ExpenseList => "expenses",
            ResourceFamily::Expense => "expense",
            ResourceFamily::Report => "report",
            ResourceFamily::Other(name) => name,
        }
    }
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ResourceFamily {
    fn from(name: &str) -> Self {
        match name {
            "expenses" => ResourceFamily::ExpenseList,
            "expense" => ResourceFamily::Expense,
            "report" => ResourceFamily::Report,
            other => ResourceFamily::Other(other.to_string()),
        }
    }
}

/// Order-independent query parameters folded into a key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyParams(BTreeMap<String, Value>);

impl KeyParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    /// Add a parameter only when it is present
    pub fn with_opt<V: Into<Value>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(name, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn canonical(&self) -> String {
        let object: Map<String, Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), canonicalize(v)))
            .collect();
        Value::Object(object).to_string()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for KeyParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Rebuild nested objects with sorted keys, whatever map ordering serde_json uses
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// A fully built cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(raw: &str) -> Self {
        CacheKey(raw.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(raw: String) -> Self {
        CacheKey(raw)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve an optional user id to the scope used in keys
pub fn user_scope(user_id: Option<&str>) -> &str {
    match user_id {
        Some(id) if !id.is_empty() => id,
        _ => ANONYMOUS_USER,
    }
}

fn escape_segment(segment: &str) -> String {
    segment.replace('%', "%25").replace(DELIMITER, "%3A")
}

/// Prefix shared by every key of one family for one user.
pub fn family_prefix(family: &ResourceFamily, user_id: &str) -> String {
    format!(
        "{}{DELIMITER}{}{DELIMITER}",
        escape_segment(family.as_str()),
        escape_segment(user_id)
    )
}

/// Build a deterministic cache key from family, user and parameters.
///
/// Parameter insertion order does not matter; any differing family, user or
/// parameter value produces a different key.
pub fn build_key(family: &ResourceFamily, user_id: &str, params: &KeyParams) -> CacheKey {
    CacheKey(format!(
        "{}{}",
        family_prefix(family, user_id),
        params.canonical()
    ))
}
