use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Key/value state threaded through one workflow run.
///
/// Keys are strings; values are JSON. Node output is merged on top: new keys
/// are added, existing keys overwritten, untouched keys kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    data: HashMap<String, serde_json::Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an ExecutionContext from initial data.
    pub fn from_map(data: HashMap<String, serde_json::Value>) -> Self {
        Self { data }
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Set a value.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Overlay a partial mapping (overwrites on conflict).
    pub fn merge<I>(&mut self, partial: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        self.data.extend(partial);
    }

    /// Owned copy of the current state, detached from later mutation.
    pub fn snapshot(&self) -> HashMap<String, serde_json::Value> {
        self.data.clone()
    }

    /// Get the underlying data map.
    pub fn data(&self) -> &HashMap<String, serde_json::Value> {
        &self.data
    }

    pub fn into_inner(self) -> HashMap<String, serde_json::Value> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<HashMap<String, serde_json::Value>> for ExecutionContext {
    fn from(data: HashMap<String, serde_json::Value>) -> Self {
        Self::from_map(data)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for ExecutionContext {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            data: map.into_iter().collect(),
        }
    }
}
