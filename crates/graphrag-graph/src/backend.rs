use crate::GraphError;
use std::sync::RwLock;

/// A key-value storage backend for the graph's node and edge tables. Keys
/// are pre-composed by the caller as `"{group_id}:{kind}:{id}"` so the
/// backend itself stays oblivious to the graph schema.
pub trait GraphBackend: Send + Sync {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), GraphError>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, GraphError>;
    fn delete(&self, key: &str) -> Result<(), GraphError>;
    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), GraphError>;
    /// Scan every value whose key starts with `prefix`. Used for per-group
    /// and per-kind enumeration (e.g. "all Sentences in group G").
    fn scan_prefix(
        &self,
        prefix: &str,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), GraphError>,
    ) -> Result<(), GraphError>;
    fn flush(&self) -> Result<(), GraphError> {
        Ok(())
    }
}

/// Selects and builds a backend.
#[derive(Clone, Debug, Default)]
pub enum BackendConfig {
    /// Persistent, pure-Rust embedded database. The default for any
    /// deployment that outlives a single process.
    Redb { path: String },
    /// In-memory `HashMap`, useful for tests and hermetic benchmarks.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    pub fn build(&self) -> Result<Box<dyn GraphBackend>, GraphError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(GraphError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

/// In-memory backend behind a single `RwLock<HashMap>`. Adequate for the
/// planned per-process deployment (§5 of the spec); a contended lock here
/// is an acceptable single point of contention at query-time QPS.
pub struct InMemoryBackend {
    records: RwLock<std::collections::HashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(std::collections::HashMap::new()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBackend for InMemoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), GraphError> {
        self.records
            .write()
            .map_err(|_| GraphError::backend("poisoned lock"))?
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, GraphError> {
        let guard = self
            .records
            .read()
            .map_err(|_| GraphError::backend("poisoned lock"))?;
        Ok(guard.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), GraphError> {
        self.records
            .write()
            .map_err(|_| GraphError::backend("poisoned lock"))?
            .remove(key);
        Ok(())
    }

    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), GraphError> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| GraphError::backend("poisoned lock"))?;
        for (key, value) in entries {
            guard.insert(key, value);
        }
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &str,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), GraphError>,
    ) -> Result<(), GraphError> {
        let guard = self
            .records
            .read()
            .map_err(|_| GraphError::backend("poisoned lock"))?;
        for (key, value) in guard.iter() {
            if key.starts_with(prefix) {
                visitor(key, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use redb::RedbBackend;
