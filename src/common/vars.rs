//! Loosely-typed variable map used for node configs and outputs.
//!
//! `Vars` wraps a JSON object and is the currency the engine moves between
//! capabilities: node configs come in as `Vars`, capability outputs go out
//! as `Vars`, and the flow context is a map of `Vars` per node.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// A JSON-object-backed key/value map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vars(Map<String, Value>);

#[allow(unused)]
impl Vars {
    /// create an empty variable map
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// set a value, serializing it to JSON
    pub fn set<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> &mut Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.0.insert(key.into(), value);
        }
        self
    }

    /// get a value, deserializing it from JSON
    pub fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Option<T> {
        self.0.get(key).cloned().and_then(|v| serde_json::from_value(v).ok())
    }

    /// get the raw JSON value for a key
    pub fn get_value(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.0.get(key)
    }

    /// check whether a key exists
    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.0.contains_key(key)
    }

    /// number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// iterate over entries
    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.0.iter()
    }
}

impl From<Value> for Vars {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }
}

impl From<Vars> for Value {
    fn from(vars: Vars) -> Self {
        Value::Object(vars.0)
    }
}
