use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{DocumentStore, PathUpdate, StoreError, check_disjoint, segments};

/// In-process document tree.
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: RwLock<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Value::Object(Map::new())),
        }
    }

    /// Copy of the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let parts = segments(path)?;
        let root = self.root.read().await;
        let mut node = &*root;
        for part in parts {
            match node.get(part) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok(Some(node.clone()))
    }

    async fn update(&self, updates: PathUpdate) -> Result<(), StoreError> {
        check_disjoint(&updates)?;
        let mut root = self.root.write().await;
        for (path, value) in updates {
            let parts = segments(&path)?;
            if value.is_null() {
                remove_path(&mut root, &parts);
            } else {
                set_path(&mut root, &parts, value);
            }
        }
        Ok(())
    }
}

fn set_path(root: &mut Value, parts: &[&str], value: Value) {
    let mut node = root;
    for part in parts {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Some(map) = node.as_object_mut() else {
            return;
        };
        node = map.entry(part.to_string()).or_insert(Value::Null);
    }
    *node = value;
}

/// Remove the node at `parts`, then drop ancestors left empty.
fn remove_path(node: &mut Value, parts: &[&str]) -> bool {
    let Some((first, rest)) = parts.split_first() else {
        return false;
    };
    let Value::Object(map) = node else {
        return false;
    };
    if rest.is_empty() {
        map.remove(*first);
    } else if let Some(child) = map.get_mut(*first) {
        if remove_path(child, rest) {
            map.remove(*first);
        }
    }
    map.is_empty()
}
