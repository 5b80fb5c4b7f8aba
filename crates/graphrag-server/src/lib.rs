//! GraphRAG Server — HTTP gateway over the retrieval orchestrator.
//!
//! This crate provides the production HTTP gateway described in §6/§14: it
//! accepts chat-shaped requests, enforces group (tenant) isolation, and
//! either runs Route 2 synchronously or enqueues Routes 3/4/5 as
//! long-running jobs whose progress can be polled or streamed.
//!
//! # Features
//!
//! - **Authentication**: API key-based auth plus per-key rate limiting.
//! - **Tenant isolation**: `X-Group-ID` is required and enforced on every
//!   retrieval route; the graph store itself never returns cross-tenant
//!   nodes (§3, §8.7).
//! - **Async job queue**: single-claim semantics, heartbeat, requeue on a
//!   missed heartbeat (§5, [`jobs`]).
//! - **Middleware**: compression, CORS, request ID tracking, structured
//!   JSON logging.
//! - **Configuration**: layered file + environment configuration via the
//!   `config` crate (§15.3).
//! - **Graceful shutdown**: SIGTERM / Ctrl+C handling.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public (no authentication)
//!
//! - `GET /` — API information
//! - `GET /health` — liveness probe
//! - `GET /ready` — readiness probe (graph store reachability)
//! - `GET /metrics` — Prometheus-style metrics
//!
//! ## Retrieval gateway (API key + `X-Group-ID` required)
//!
//! - `POST /chat` — synchronous for Route 2, else returns a job id (§6)
//! - `POST /chat/stream` — newline-delimited JSON progress + final answer
//! - `GET /chat/status/{job_id}` — poll an enqueued job

pub mod config;
pub mod error;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::start_server;
pub use state::ServerState;
