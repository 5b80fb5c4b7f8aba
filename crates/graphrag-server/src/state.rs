use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::jobs::JobQueue;
use dashmap::DashMap;
use graphrag_embedding::{EmbeddingConfig, EmbeddingGateway};
use graphrag_graph::{GraphStore, GraphStoreConfig};
use graphrag_retrieval::ner::{EntityExtractor, HeuristicEntityExtractor};
use graphrag_retrieval::synthesis::{StubSynthesizer, Synthesizer};
use std::sync::Arc;

/// Shared application state: the graph store and embedding gateway the
/// orchestrator reads from, plus the gateway's own concerns (rate limiting,
/// job tracking) that have nothing to do with retrieval.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,

    /// Rate limit tracking: API key -> (count, window_start)
    rate_limiter: Arc<DashMap<String, (u32, std::time::Instant)>>,

    pub graph: Arc<GraphStore>,
    pub embeddings: Arc<EmbeddingGateway>,
    pub entity_extractor: Arc<dyn EntityExtractor>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub jobs: JobQueue,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let graph = Arc::new(GraphStore::new(GraphStoreConfig::default()).map_err(graphrag_retrieval::RetrievalError::from)?);

        // `voyage_v2_enabled` (§6 `VOYAGE_V2_ENABLED`) selects the contextualised embedder vs the
        // legacy one at the provider level; this build only wires the deterministic stub provider
        // end-to-end (no API credentials are plumbed through `ServerConfig` yet), so the flag has
        // no effect here until a real `api`/`onnx` mode is configured.
        let embeddings = Arc::new(EmbeddingGateway::new(EmbeddingConfig {
            mode: "stub".into(),
            ..Default::default()
        }));

        Ok(Self {
            jobs: JobQueue::new(config.job_heartbeat_timeout()),
            config: Arc::new(config),
            rate_limiter: Arc::new(DashMap::new()),
            graph,
            embeddings,
            entity_extractor: Arc::new(HeuristicEntityExtractor),
            synthesizer: Arc::new(StubSynthesizer),
        })
    }

    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = std::time::Instant::now();
        let window = std::time::Duration::from_secs(60);
        let limit = self.config.rate_limit_per_minute;

        let mut entry = self.rate_limiter.entry(key.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }

    pub fn algorithm_version_used(&self, requested: Option<&str>) -> String {
        requested.map(str::to_string).unwrap_or_else(|| self.config.default_algorithm_version.clone())
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
