//! Cache keys derived from an operation's full input identity.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::fingerprint::sha256_hex;

/// Named parameters of a cached operation.
///
/// Entries are kept sorted by name, so two parameter sets built in a
/// different insertion order are equal and produce the same [`CacheKey`].
/// Values are taken as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a parameter, returning the previous value for that name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Canonical text form used for hashing: a JSON object with sorted keys.
    pub fn canonical(&self) -> String {
        let body = self
            .0
            .iter()
            .map(|(name, value)| format!("{}:{}", Value::from(name.as_str()), value))
            .collect::<Vec<_>>()
            .join(",");
        format!("{{{}}}", body)
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl From<BTreeMap<String, Value>> for Params {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

/// Deterministic key for a (file path, operation, parameters) triple.
///
/// The path is used as given, without normalization: `a.wav` and
/// `./a.wav` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Compute the key for an operation on a file.
    pub fn compute(path: impl AsRef<Path>, operation: &str, params: &Params) -> Self {
        let input = format!(
            "{}_{}_{}",
            path.as_ref().display(),
            operation,
            params.canonical()
        );
        Self(sha256_hex(&input))
    }

    /// The key as a lowercase hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
