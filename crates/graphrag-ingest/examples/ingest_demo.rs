use graphrag_ingest::{build_skeleton, IngestConfig, ParsedUnit, RawDocument, SentenceSource};

fn main() {
    let doc = RawDocument {
        doc_id: String::new(),
        group_id: "tenant-a".into(),
        title: "Master Services Agreement".into(),
        received_at: None,
        units: vec![
            ParsedUnit {
                paragraph_id: "p1".into(),
                text: "This agreement is effective as of the signing date. \
                       Either party may terminate with thirty days notice."
                    .into(),
                section_path: vec!["Terms".into()],
                source: SentenceSource::Paragraph,
                page: 1,
                confidence: 0.98,
                geometry: None,
            },
            ParsedUnit {
                paragraph_id: "p2".into(),
                text: "The total invoice amount is due net thirty.".into(),
                section_path: vec!["Terms".into(), "Payment".into()],
                source: SentenceSource::Paragraph,
                page: 1,
                confidence: 0.97,
                geometry: None,
            },
        ],
    };

    match build_skeleton(doc, &IngestConfig::default()) {
        Ok(skeleton) => println!("{skeleton:#?}"),
        Err(err) => eprintln!("skeleton construction failed: {err}"),
    }
}
