use std::path::PathBuf;
use std::{env, error::Error};

use graphrag_embedding::{EmbeddingConfig, EmbeddingGateway};

/// Embeds a single contextualised unit, preferring a local ONNX model if the
/// expected assets are present next to the workspace and otherwise falling
/// back to the deterministic stub provider.
///
/// ```bash
/// cargo run -p graphrag-embedding --example embed -- "sentence-1" "The total was due net thirty."
/// ```
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let unit_id = args.next().unwrap_or_else(|| "example-unit".into());
    let text = args
        .next()
        .unwrap_or_else(|| "The total was due net thirty.".into());

    let mut cfg = EmbeddingConfig::default();
    match locate_model_assets() {
        Some((model_path, tokenizer_path)) => {
            cfg.mode = "onnx".into();
            cfg.model_path = model_path;
            cfg.tokenizer_path = Some(tokenizer_path);
            println!("Running local ONNX model at {}", cfg.model_path.display());
        }
        None => {
            cfg.mode = "stub".into();
            println!("ONNX assets not found, falling back to deterministic stub provider");
        }
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
    println!(
        "first values: {:?}",
        &embedding.vector[..embedding.vector.len().min(8)]
    );
    println!("normalized: {}", embedding.normalized);

    Ok(())
}

fn locate_model_assets() -> Option<(PathBuf, PathBuf)> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir.parent()?.parent()?;

    let model_dir = workspace_root.join("models").join("bge-large-en-v1.5");
    let model_path = model_dir.join("onnx").join("model.onnx");
    let tokenizer_path = model_dir.join("tokenizer.json");

    if model_path.exists() && tokenizer_path.exists() {
        Some((model_path, tokenizer_path))
    } else {
        None
    }
}
