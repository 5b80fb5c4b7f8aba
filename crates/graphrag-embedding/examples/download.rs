//! Demonstrates auto-downloaded ONNX model assets.
//!
//! - Uses [`EmbeddingConfig`] with `model_url`/`tokenizer_url` set so the
//!   local ONNX path is fetched on first use if missing.
//! - Uses `/resolve/` not `/blob/` for direct file downloads from Hugging Face.
//!
//! ```bash
//! cargo run -p graphrag-embedding --example download
//! ```
//!
//! Requires network access; the first run is slower due to the download.

use graphrag_embedding::{EmbeddingConfig, EmbeddingGateway};

#[tokio::main]
async fn main() {
    let cfg = EmbeddingConfig {
        mode: "onnx".into(),
        normalize: true,
        model_url: Some(
            "https://huggingface.co/BAAI/bge-large-en-v1.5/resolve/main/onnx/model.onnx".into(),
        ),
        tokenizer_url: Some(
            "https://huggingface.co/BAAI/bge-large-en-v1.5/resolve/main/tokenizer.json".into(),
        ),
        ..Default::default()
    };
    let gateway = EmbeddingGateway::new(cfg);

    let units = vec![("sentence-1".to_string(), "my name is ashutosh kumar".to_string())];
    let result = gateway.embed_contextual("download-test", "", &units).await;

    match result {
        Ok(embeddings) => println!("embeddings: {embeddings:?}"),
        Err(why) => println!("error: {why}"),
    }
}
