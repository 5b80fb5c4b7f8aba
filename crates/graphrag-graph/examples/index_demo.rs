use graphrag_graph::types::{Node, Sentence, SentenceSource, EMBEDDING_DIM};
use graphrag_graph::vectors::SENTENCE_EMBEDDINGS_V2;
use graphrag_graph::{GraphStore, GraphStoreConfig};

fn embedding(seed: f32) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[0] = seed;
    v
}

fn sentence(id: &str, chunk_id: &str, seed: f32) -> Node {
    Node::Sentence(Sentence {
        id: id.into(),
        group_id: "demo-tenant".into(),
        chunk_id: chunk_id.into(),
        paragraph_id: "p1".into(),
        section_path: "Terms > Payment".into(),
        parent_paragraph_text: "The total invoice amount was due net thirty.".into(),
        page: 1,
        confidence: 0.97,
        char_offset: 0,
        char_len: 40,
        geometry: vec![],
        embedding_v2: embedding(seed),
        source: SentenceSource::Paragraph,
        text: "The total invoice amount was due net thirty.".into(),
        next_sentence_id: None,
        prev_sentence_id: None,
    })
}

fn main() -> anyhow::Result<()> {
    let store = GraphStore::new(GraphStoreConfig::default())?;

    store.put_node(sentence("s1", "c1", 1.0))?;
    store.put_node(sentence("s2", "c2", 0.98))?;

    let query = embedding(1.0);
    let hits = store.search_vectors(SENTENCE_EMBEDDINGS_V2, "demo-tenant", &query, 5)?;
    println!("Nearest sentences: {hits:#?}");

    if let Some(node) = store.get_node("demo-tenant", "s1")? {
        println!("Re-fetched node: {node:?}");
    }

    Ok(())
}
