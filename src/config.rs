//! YAML configuration for the `graphrag` umbrella binary.
//!
//! Generalizes the reference workspace's `UcfpConfig` — one YAML document
//! covering every pipeline stage, loaded once at startup into an immutable
//! struct (§9's "configuration is read once at startup" design note) — from
//! ingest/canonical/perceptual/semantic/index/matcher sections to
//! embedding/graph/version-registry sections. The HTTP server's own
//! environment-driven configuration (`graphrag_server::ServerConfig`) is
//! untouched by this file; `graphrag serve` loads it separately.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use graphrag_embedding::EmbeddingConfig;
use graphrag_graph::{AnnConfig, BackendConfig, GraphStoreConfig};

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GraphragConfig {
    /// Configuration format version.
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub graph: GraphYamlConfig,

    /// Maps an `algorithm_version_used` label (§9's version registry) to the
    /// route handler path it resolves to. A request header selects the
    /// version; a missing header uses `default_algorithm_version`.
    #[serde(default = "default_version_registry")]
    pub version_registry: HashMap<String, String>,

    #[serde(default = "default_algorithm_version")]
    pub default_algorithm_version: String,
}

impl GraphragConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: GraphragConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }
        if !self.version_registry.contains_key(&self.default_algorithm_version) {
            return Err(ConfigLoadError::Validation(format!(
                "default_algorithm_version '{}' is not a key in version_registry",
                self.default_algorithm_version
            )));
        }
        Ok(())
    }

    /// Builds the runtime [`GraphStoreConfig`] this YAML section describes.
    pub fn graph_store_config(&self) -> GraphStoreConfig {
        self.graph.to_store_config()
    }
}

impl Default for GraphragConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            embedding: EmbeddingConfig::default(),
            graph: GraphYamlConfig::default(),
            version_registry: default_version_registry(),
            default_algorithm_version: default_algorithm_version(),
        }
    }
}

/// Graph store section: the ANN/backend knobs that the graph crate's own
/// config types don't expose over serde (they carry no `Serialize`/
/// `Deserialize` derive, since nothing outside this umbrella crate needs to
/// load them from a file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphYamlConfig {
    /// `None` selects the in-memory backend (tests, ephemeral runs);
    /// `Some(path)` selects the persistent redb backend at that path.
    #[serde(default)]
    pub backend_path: Option<String>,

    #[serde(default = "default_ann_m")]
    pub ann_m: usize,

    #[serde(default = "default_ann_ef_construction")]
    pub ann_ef_construction: usize,

    #[serde(default = "default_ann_ef_search")]
    pub ann_ef_search: usize,
}

impl GraphYamlConfig {
    fn to_store_config(&self) -> GraphStoreConfig {
        let backend = match &self.backend_path {
            Some(path) => BackendConfig::redb(path.clone()),
            None => BackendConfig::in_memory(),
        };
        GraphStoreConfig {
            backend,
            ann: AnnConfig {
                m: self.ann_m,
                ef_construction: self.ann_ef_construction,
                ef_search: self.ann_ef_search,
                ..AnnConfig::default()
            },
        }
    }
}

impl Default for GraphYamlConfig {
    fn default() -> Self {
        Self {
            backend_path: None,
            ann_m: default_ann_m(),
            ann_ef_construction: default_ann_ef_construction(),
            ann_ef_search: default_ann_ef_search(),
        }
    }
}

fn default_ann_m() -> usize {
    AnnConfig::default().m
}
fn default_ann_ef_construction() -> usize {
    AnnConfig::default().ef_construction
}
fn default_ann_ef_search() -> usize {
    AnnConfig::default().ef_search
}

fn default_version_registry() -> HashMap<String, String> {
    HashMap::from([
        ("v1".to_string(), "graphrag_retrieval::route::Route".to_string()),
        ("route2-only".to_string(), "graphrag_retrieval::routes::local::LocalRoute".to_string()),
    ])
}

fn default_algorithm_version() -> String {
    "v1".to_string()
}
