use std::{env, error::Error};

use graphrag_embedding::{EmbeddingConfig, EmbeddingGateway};

/// Demonstrates batching several units of the same document/section through
/// one `embed_contextual` call.
///
/// ```bash
/// cargo run -p graphrag-embedding --example batch_embed -- "sentence-1" "text one" "sentence-2" "text two"
/// ```
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let mut units = Vec::new();

    while let (Some(id), Some(text)) = (args.next(), args.next()) {
        units.push((id, text));
    }

    if units.is_empty() {
        units.push(("sentence-1".into(), "The warranty lasts twelve months.".into()));
        units.push(("sentence-2".into(), "The buyer must inspect within ten days.".into()));
    }

    let gateway = EmbeddingGateway::new(EmbeddingConfig {
        mode: "stub".into(),
        ..Default::default()
    });

    let embeddings = gateway
        .embed_contextual("Sample Contract", "Terms > Warranty", &units)
        .await?;
    println!("generated {} embeddings", embeddings.len());

    for embedding in embeddings {
        println!(
            "{} => dim={}, normalized={}, head={:?}",
            embedding.id,
            embedding.vector.len(),
            embedding.normalized,
            &embedding.vector[..embedding.vector.len().min(5)]
        );
    }

    Ok(())
}
