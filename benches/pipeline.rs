use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use graphrag::config::GraphragConfig;
use graphrag::embedding::{EmbeddingConfig, EmbeddingGateway};
use graphrag::graph::GraphStore;
use graphrag::indexing::IndexingPipeline;
use graphrag::ingest::{ParsedUnit, RawDocument, SentenceSource};
use graphrag::retrieval::ner::HeuristicEntityExtractor;
use graphrag::retrieval::orchestrator::Orchestrator;
use graphrag::retrieval::synthesis::StubSynthesizer;
use graphrag::retrieval::types::QueryOptions;

fn sample_document(group_id: &str, paragraphs: usize) -> RawDocument {
    let units = (0..paragraphs)
        .map(|i| ParsedUnit {
            paragraph_id: format!("p{i}"),
            text: format!(
                "Acme Corp agreed to pay Agent Fabrikam net thirty for shipment {i} under the master agreement."
            ),
            section_path: vec!["Terms".into(), "Payment".into()],
            source: SentenceSource::Paragraph,
            page: (i / 20 + 1) as u32,
            confidence: 0.95,
            geometry: None,
        })
        .collect();
    RawDocument {
        doc_id: String::new(),
        group_id: group_id.to_string(),
        title: "Bench Master Agreement".into(),
        received_at: None,
        units,
    }
}

fn bench_indexing_pipeline(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("indexing_pipeline");

    for paragraphs in [10usize, 50, 200].iter() {
        group.throughput(Throughput::Elements(*paragraphs as u64));
        group.bench_function(format!("run_{paragraphs}_paragraphs"), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let config = GraphragConfig::default();
                    let store = GraphStore::new(config.graph_store_config()).unwrap();
                    let gateway = EmbeddingGateway::new(EmbeddingConfig {
                        mode: "stub".into(),
                        ..Default::default()
                    });
                    let extractor = HeuristicEntityExtractor;
                    let synthesizer = StubSynthesizer;
                    let pipeline = IndexingPipeline::new(&store, &gateway, &extractor, &synthesizer);
                    let doc = sample_document("bench-tenant", black_box(*paragraphs));
                    pipeline.run(doc).await.expect("pipeline run");
                });
            });
        });
    }

    group.finish();
}

fn bench_orchestrator_query(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, gateway) = rt.block_on(async {
        let config = GraphragConfig::default();
        let store = GraphStore::new(config.graph_store_config()).unwrap();
        let gateway = EmbeddingGateway::new(EmbeddingConfig {
            mode: "stub".into(),
            ..Default::default()
        });
        let extractor = HeuristicEntityExtractor;
        let synthesizer = StubSynthesizer;
        let pipeline = IndexingPipeline::new(&store, &gateway, &extractor, &synthesizer);
        pipeline
            .run(sample_document("bench-query-tenant", 50))
            .await
            .expect("pipeline run");
        (store, gateway)
    });

    c.bench_function("orchestrator_answer_fact_extraction", |b| {
        b.iter(|| {
            rt.block_on(async {
                let extractor = HeuristicEntityExtractor;
                let synthesizer = StubSynthesizer;
                let orchestrator = Orchestrator::new(&store, &gateway, &extractor, &synthesizer);
                let answer = orchestrator
                    .answer(
                        black_box("Who is the Agent for Acme Corp?"),
                        "bench-query-tenant",
                        QueryOptions::default(),
                    )
                    .await
                    .expect("answer");
                black_box(answer);
            });
        });
    });
}

criterion_group!(benches, bench_indexing_pipeline, bench_orchestrator_query);
criterion_main!(benches);
