use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::RwLock;

use crate::errors::CoreError;
use super::traits::{StoreReader, StoreWriter};

const NAME: &str = "Memory";

/// In-process document store holding one JSON tree.
///
/// Behaves like the remote store for reads: objects are walked by key,
/// arrays by numeric index, and `null` nodes read as missing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: RwLock<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// Seed the store with an existing tree.
    pub fn from_value(root: Value) -> Self {
        Self {
            root: RwLock::new(root),
        }
    }

    /// A copy of the whole tree.
    pub fn snapshot(&self) -> Result<Value, CoreError> {
        Ok(self.read_root()?.clone())
    }

    fn read_root(&self) -> Result<std::sync::RwLockReadGuard<'_, Value>, CoreError> {
        self.root.read().map_err(|_| poisoned())
    }
}

fn poisoned() -> CoreError {
    CoreError::Store {
        backend: NAME.into(),
        message: "store lock poisoned".into(),
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn child<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

#[async_trait]
impl StoreReader for MemoryStore {
    fn name(&self) -> &str {
        NAME
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, CoreError> {
        let root = self.read_root()?;
        let mut node = &*root;
        for key in segments(path) {
            match child(node, key) {
                Some(next) => node = next,
                None => return Ok(None),
            }
        }

        if node.is_null() {
            Ok(None)
        } else {
            Ok(Some(node.clone()))
        }
    }
}

#[async_trait]
impl StoreWriter for MemoryStore {
    async fn set(&self, path: &str, value: Value) -> Result<(), CoreError> {
        let mut root = self.root.write().map_err(|_| poisoned())?;
        let mut node = &mut *root;
        for key in segments(path) {
            // Scalars and arrays on the way down are replaced by objects.
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            node = &mut node[key];
        }
        *node = value;
        Ok(())
    }
}
