//! Realtime document store access.
//!
//! Documents live in one JSON tree addressed by slash-separated paths. Writes
//! go through [`DocumentStore::update`], which applies every path of a
//! [`PathUpdate`] atomically or none of them.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod memory;
mod rtdb;

pub use memory::MemoryStore;
pub use rtdb::RtdbStore;

/// Path → value map for a multi-path update. `Value::Null` deletes the path.
pub type PathUpdate = BTreeMap<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid path {0:?}")]
    InvalidPath(String),
    #[error("update paths overlap: {0} and {1}")]
    OverlappingPaths(String, String),
    #[error("document store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("document store answered {status}: {body}")]
    Status { status: u16, body: String },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Value at `path`, or `None` when nothing is stored there.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Apply all writes in one atomic step.
    async fn update(&self, updates: PathUpdate) -> Result<(), StoreError>;

    /// Short backend name, reported by the health check.
    fn backend(&self) -> &'static str;
}

/// Split a path into its segments, rejecting empty or reserved ones.
pub fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let reserved = ['.', '#', '$', '[', ']'];
    if parts.is_empty() || parts.iter().any(|p| p.contains(reserved)) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(parts)
}

/// Reject updates where one path is a prefix of another.
pub fn check_disjoint(updates: &PathUpdate) -> Result<(), StoreError> {
    let mut normalized: Vec<(String, &String)> = Vec::with_capacity(updates.len());
    for path in updates.keys() {
        normalized.push((segments(path)?.join("/"), path));
    }
    for (i, (a, raw_a)) in normalized.iter().enumerate() {
        for (b, raw_b) in &normalized[i + 1..] {
            let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
            if short == long || long.starts_with(&format!("{short}/")) {
                return Err(StoreError::OverlappingPaths(
                    raw_a.to_string(),
                    raw_b.to_string(),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_paths_overlap_even_when_not_adjacent() {
        let mut updates = PathUpdate::new();
        updates.insert("a/b".into(), json!(1));
        updates.insert("a/b-x".into(), json!(1));
        updates.insert("a/b/c".into(), json!(1));
        assert!(matches!(
            check_disjoint(&updates),
            Err(StoreError::OverlappingPaths(_, _))
        ));
    }

    #[test]
    fn sibling_paths_are_disjoint() {
        let mut updates = PathUpdate::new();
        updates.insert("facturas/1".into(), json!({}));
        updates.insert("facturasPorFecha/2024-01-01/1".into(), json!(true));
        updates.insert("facturasPorEstado/PAGADA/1".into(), json!(true));
        assert!(check_disjoint(&updates).is_ok());
    }

    #[test]
    fn empty_segments_are_dropped() {
        assert_eq!(segments("/facturas//x/").unwrap(), vec!["facturas", "x"]);
        assert!(segments("").is_err());
    }
}
