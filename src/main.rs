//! `graphrag` CLI: run the HTTP gateway, or index one document from the
//! command line without standing up a server.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use graphrag_ingest::RawDocument;
use graphrag_retrieval::ner::HeuristicEntityExtractor;
use graphrag_retrieval::synthesis::StubSynthesizer;

use graphrag::config::GraphragConfig;
use graphrag::indexing::IndexingPipeline;

#[derive(Parser)]
#[command(name = "graphrag", version, about = "Graph-augmented retrieval engine")]
struct Cli {
    /// Path to a `GraphragConfig` YAML file. Falls back to built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the Axum HTTP gateway (`graphrag-server`).
    Serve,
    /// Run one document through the indexing pipeline.
    Index {
        /// Path to a JSON-encoded `RawDocument`.
        document: PathBuf,
    },
}

fn load_config(path: &Option<PathBuf>) -> anyhow::Result<GraphragConfig> {
    match path {
        Some(path) => Ok(GraphragConfig::from_file(path)?),
        None => Ok(GraphragConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            let config = server::ServerConfig::load()?;
            server::start_server(config).await?;
        }
        Command::Index { document } => {
            let config = load_config(&cli.config)?;
            let raw: RawDocument = serde_json::from_str(&fs::read_to_string(&document)?)?;

            let store = graphrag_graph::GraphStore::new(config.graph_store_config())?;
            let gateway = graphrag_embedding::EmbeddingGateway::new(config.embedding.clone());
            let extractor = HeuristicEntityExtractor;
            let synthesizer = StubSynthesizer;

            let group_id = raw.group_id.clone();
            let pipeline = IndexingPipeline::new(&store, &gateway, &extractor, &synthesizer);
            pipeline.run(raw).await?;

            println!("indexed document from {} into group `{group_id}`", document.display());
        }
    }

    Ok(())
}
