//! Mount state tree addressed by dotted paths (`mount.target.right_ascension`).
//!
//! `MountStore` is a cheap handle; clones share the same tree. Every
//! operation takes the lock once and never across an `.await`, so a composite
//! `update` is observed by readers either fully applied or not at all.

use crate::domain::model::StoreFormat;
use crate::utils::error::Result;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone)]
pub struct MountStore {
    tree: Arc<RwLock<Value>>,
}

impl MountStore {
    /// Store seeded with the default mount state. Targets stay absent.
    pub fn new() -> Self {
        Self::from_value(default_tree())
    }

    pub fn empty() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    pub fn from_value(tree: Value) -> Self {
        Self {
            tree: Arc::new(RwLock::new(tree)),
        }
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        let tree = self.tree.read().unwrap_or_else(PoisonError::into_inner);
        lookup(&tree, path).cloned()
    }

    /// Typed read; `None` when the path is missing or does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        self.get(path)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    pub fn contains(&self, path: &str) -> bool {
        let tree = self.tree.read().unwrap_or_else(PoisonError::into_inner);
        lookup(&tree, path).is_some()
    }

    /// Replaces the value at `path`, creating intermediate objects.
    pub fn set(&self, path: &str, value: Value) {
        let mut tree = self.tree.write().unwrap_or_else(PoisonError::into_inner);
        let mut node = &mut *tree;
        for segment in path.split('.') {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            node = match node {
                Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
                _ => unreachable!("node was just made an object"),
            };
        }
        *node = value;
    }

    /// Deep-merges `partial` into the tree under a single write lock.
    pub fn update(&self, partial: Value) {
        let mut tree = self.tree.write().unwrap_or_else(PoisonError::into_inner);
        merge(&mut tree, partial);
    }

    pub fn snapshot(&self) -> Value {
        self.tree
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.snapshot())?)
    }

    pub fn serialize(&self, format: StoreFormat) -> Result<String> {
        match format {
            StoreFormat::Json => self.to_json(),
            StoreFormat::Yaml => self.to_yaml(),
        }
    }

    /// Merges a serialized tree, trying JSON first and YAML second.
    pub fn load_str(&self, contents: &str) -> Result<()> {
        let data: Value = match serde_json::from_str(contents) {
            Ok(data) => data,
            Err(json_err) => {
                tracing::debug!("State is not JSON ({}), trying YAML", json_err);
                serde_yaml::from_str(contents)?
            }
        };

        // 空檔案在 YAML 中解析為 null
        if !data.is_null() {
            self.update(data);
        }
        Ok(())
    }
}

impl Default for MountStore {
    fn default() -> Self {
        Self::new()
    }
}

fn default_tree() -> Value {
    json!({
        "mount": {
            "right_ascension": {"hours": 0.0, "minutes": 0.0, "seconds": 0.0},
            "declination": {"degrees": 0.0, "minutes": 0.0, "seconds": 0.0},
            "slew": {"rate": "max"},
            "alignment_status": {"is_tracking": false},
            "high_precision": false
        }
    })
}

fn lookup<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(tree, |node, segment| node.as_object()?.get(segment))
}

/// Deep merge: objects merge key by key, anything else replaces.
pub fn merge(target: &mut Value, partial: Value) {
    match (target, partial) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
