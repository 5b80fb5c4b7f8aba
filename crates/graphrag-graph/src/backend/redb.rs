//! Redb (pure-Rust embedded database) backend for the graph's node/edge
//! tables.
//!
//! Redb gives ACID transactions with MVCC and zero-copy reads without an
//! external dependency, which is why it is the default persistent backend
//! for a single-process deployment (§5 of the spec — retrieval never blocks
//! on the indexing write lock; redb's snapshot reads give that for free).
//!
//! # Configuration example
//! ```yaml
//! graph:
//!   backend: "redb"
//!   redb:
//!     path: "/data/graphrag.redb"
//! ```

use crate::{GraphBackend, GraphError};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

const GRAPH_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("graph_data");

/// Thread-safe redb-backed store. Redb handles its own internal locking and
/// MVCC, so `Arc<Database>` is sufficient for sharing across threads.
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let db = Database::create(path).map_err(|e| GraphError::backend(e.to_string()))?;

        let write_txn = db
            .begin_write()
            .map_err(|e| GraphError::backend(e.to_string()))?;
        {
            let _table = write_txn
                .open_table(GRAPH_TABLE)
                .map_err(|e| GraphError::backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| GraphError::backend(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl GraphBackend for RedbBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), GraphError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| GraphError::backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(GRAPH_TABLE)
                .map_err(|e| GraphError::backend(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| GraphError::backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| GraphError::backend(e.to_string()))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, GraphError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| GraphError::backend(e.to_string()))?;
        let table = read_txn
            .open_table(GRAPH_TABLE)
            .map_err(|e| GraphError::backend(e.to_string()))?;

        match table
            .get(key)
            .map_err(|e| GraphError::backend(e.to_string()))?
        {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<(), GraphError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| GraphError::backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(GRAPH_TABLE)
                .map_err(|e| GraphError::backend(e.to_string()))?;
            table
                .remove(key)
                .map_err(|e| GraphError::backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| GraphError::backend(e.to_string()))?;
        Ok(())
    }

    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), GraphError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| GraphError::backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(GRAPH_TABLE)
                .map_err(|e| GraphError::backend(e.to_string()))?;
            for (key, value) in entries {
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(|e| GraphError::backend(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| GraphError::backend(e.to_string()))?;
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &str,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), GraphError>,
    ) -> Result<(), GraphError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| GraphError::backend(e.to_string()))?;
        let table = read_txn
            .open_table(GRAPH_TABLE)
            .map_err(|e| GraphError::backend(e.to_string()))?;

        for item in table
            .iter()
            .map_err(|e| GraphError::backend(e.to_string()))?
        {
            let (key, value) = item.map_err(|e| GraphError::backend(e.to_string()))?;
            if key.value().starts_with(prefix) {
                visitor(key.value(), value.value())?;
            }
        }

        Ok(())
    }

    fn flush(&self) -> Result<(), GraphError> {
        // Redb commits are synchronous, so there is nothing to flush.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend.put("g1:Sentence:s1", b"value1").unwrap();
        let result = backend.get("g1:Sentence:s1").unwrap();
        assert_eq!(result, Some(b"value1".to_vec()));

        let result = backend.get("nonexistent").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn batch_put_and_get() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        let entries = vec![
            ("g1:Entity:e1".to_string(), b"value1".to_vec()),
            ("g1:Entity:e2".to_string(), b"value2".to_vec()),
            ("g2:Entity:e1".to_string(), b"value3".to_vec()),
        ];
        backend.batch_put(entries).unwrap();

        assert_eq!(backend.get("g1:Entity:e1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(backend.get("g2:Entity:e1").unwrap(), Some(b"value3".to_vec()));
    }

    #[test]
    fn delete_removes_key() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend.put("g1:Entity:e1", b"value1").unwrap();
        backend.delete("g1:Entity:e1").unwrap();
        assert_eq!(backend.get("g1:Entity:e1").unwrap(), None);
    }

    #[test]
    fn scan_prefix_filters_by_group() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend.put("g1:Entity:e1", b"v1").unwrap();
        backend.put("g1:Entity:e2", b"v2").unwrap();
        backend.put("g2:Entity:e1", b"v3").unwrap();

        let mut collected = Vec::new();
        backend
            .scan_prefix("g1:", &mut |k, v| {
                collected.push((k.to_string(), v.to_vec()));
                Ok(())
            })
            .unwrap();

        assert_eq!(collected.len(), 2);
        assert!(collected.iter().all(|(k, _)| k.starts_with("g1:")));
    }
}
