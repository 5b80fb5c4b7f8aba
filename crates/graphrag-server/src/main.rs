//! GraphRAG Server binary — the HTTP gateway of §6/§14, exposing the
//! retrieval orchestrator over `/chat`, `/chat/stream`, and
//! `/chat/status/{job_id}` with API-key auth and group enforcement.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
