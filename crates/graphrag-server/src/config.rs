use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration (§10, §14, §15.3).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds. Applies to the synchronous `/chat` path
    /// (Route 2's 10 s HTTP budget); async routes enqueue instead of
    /// blocking on this timeout (§5).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Rate limit: requests per minute per API key
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,

    /// API keys for authentication (in production, use a database)
    #[serde(default)]
    pub api_keys: HashSet<String>,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Whether the current-generation (Route 5) pipeline is available at all.
    #[serde(default = "default_true")]
    pub algorithm_v2_enabled: bool,

    /// Algorithm version used when a request carries no `X-Algorithm-Version`
    /// header (§6, §9's version registry).
    #[serde(default = "default_algorithm_version")]
    pub default_algorithm_version: String,

    /// Skip Route 3's optional boost stages.
    #[serde(default = "default_true")]
    pub route3_fast_mode: bool,

    /// Merge sentence evidence into Route 2's context.
    #[serde(default = "default_true")]
    pub skeleton_enrichment_enabled: bool,

    /// Enable `RELATED_TO` expansion in Route 2.
    #[serde(default = "default_true")]
    pub skeleton_graph_traversal_enabled: bool,

    /// Use the contextualised embedder instead of the legacy one.
    #[serde(default = "default_true")]
    pub voyage_v2_enabled: bool,

    /// Entity-level k-NN similarity cutoff (§4.2's default, surfaced here so
    /// operators can tune it without a redeploy of `graphrag-graph`).
    #[serde(default = "default_knn_similarity_cutoff")]
    pub knn_similarity_cutoff: f32,

    /// Heartbeat interval for claimed async jobs (§5's queue contract).
    #[serde(default = "default_job_heartbeat_secs")]
    pub job_heartbeat_secs: u64,

    /// A claimed job missing this many seconds of heartbeats is requeued.
    #[serde(default = "default_job_heartbeat_timeout_secs")]
    pub job_heartbeat_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            api_keys: HashSet::new(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            algorithm_v2_enabled: default_true(),
            default_algorithm_version: default_algorithm_version(),
            route3_fast_mode: default_true(),
            skeleton_enrichment_enabled: default_true(),
            skeleton_graph_traversal_enabled: default_true(),
            voyage_v2_enabled: default_true(),
            knn_similarity_cutoff: default_knn_similarity_cutoff(),
            job_heartbeat_secs: default_job_heartbeat_secs(),
            job_heartbeat_timeout_secs: default_job_heartbeat_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("GRAPHRAG_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;

        // Add demo API key if none configured (for development)
        let mut config = config;
        if config.api_keys.is_empty() {
            tracing::warn!("No API keys configured, using demo key 'demo-key-12345'");
            config.api_keys.insert("demo-key-12345".to_string());
        }

        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }

    pub fn job_heartbeat(&self) -> Duration {
        Duration::from_secs(self.job_heartbeat_secs)
    }

    pub fn job_heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.job_heartbeat_timeout_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_rate_limit_per_minute() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_algorithm_version() -> String {
    "route5-unified".to_string()
}

fn default_knn_similarity_cutoff() -> f32 {
    0.60
}

fn default_job_heartbeat_secs() -> u64 {
    10
}

fn default_job_heartbeat_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout_secs, 10);
        assert_eq!(cfg.max_body_size_mb, 10);
        assert_eq!(cfg.rate_limit_per_minute, 100);
        assert!(cfg.enable_cors);
        assert!(cfg.metrics_enabled);
        assert_eq!(cfg.default_algorithm_version, "route5-unified");
        assert_eq!(cfg.job_heartbeat_timeout_secs, 30);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }
}
