use std::{env, error::Error};

use graphrag_embedding::{EmbeddingConfig, EmbeddingGateway};

/// Demonstrates remote-API embedding generation (the `"api"` dispatch mode),
/// falling back to the deterministic stub when no endpoint is configured.
///
/// ## Environment variables
///
/// - `GRAPHRAG_EMBEDDING_API_URL`: the contextual-embedding inference endpoint
/// - `GRAPHRAG_EMBEDDING_API_TOKEN`: bearer token for that endpoint
///
/// ```bash
/// GRAPHRAG_EMBEDDING_API_URL=https://router.huggingface.co/hf-inference/models/BAAI/bge-large-en-v1.5/pipeline/feature-extraction \
/// GRAPHRAG_EMBEDDING_API_TOKEN=hf_xxx \
/// cargo run -p graphrag-embedding --example api_embed -- "sentence-1" "Some text"
/// ```
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let unit_id = args.next().unwrap_or_else(|| "api-unit".into());
    let text = args
        .next()
        .unwrap_or_else(|| "Text to embed via the remote API".into());

    let api_url = env::var("GRAPHRAG_EMBEDDING_API_URL").ok();
    let api_token = env::var("GRAPHRAG_EMBEDDING_API_TOKEN").ok();

    let mut cfg = EmbeddingConfig {
        mode: "api".into(),
        api_url: api_url.clone(),
        api_auth_header: api_token.map(|token| format!("Bearer {token}")),
        api_provider: Some("hf".into()),
        api_timeout_secs: Some(60),
        ..EmbeddingConfig::default()
    };

    if let Some(url) = &api_url {
        println!("using remote API for embedding generation");
        println!("  url: {url}");
    } else {
        cfg.mode = "stub".into();
        println!("GRAPHRAG_EMBEDDING_API_URL not set; falling back to deterministic stub provider");
        println!("  to use the API, export GRAPHRAG_EMBEDDING_API_URL and GRAPHRAG_EMBEDDING_API_TOKEN");
    }

    let gateway = EmbeddingGateway::new(cfg);
    let units = vec![(unit_id.clone(), text)];
    let embeddings = gateway
        .embed_contextual("Sample Contract", "Terms > Payment", &units)
        .await?;
    let embedding = &embeddings[0];

    println!("id: {}", embedding.id);
    println!("model: {}", embedding.model_name);
    println!("dim: {}", embedding.vector.len());
    println!("normalized: {}", embedding.normalized);
    println!(
        "first values: {:?}",
        &embedding.vector[..embedding.vector.len().min(8)]
    );

    Ok(())
}
