use graphrag_ingest::{build_skeleton, IngestConfig, ParsedUnit, RawDocument, SentenceSource};

fn paragraph(id: &str, text: &str) -> ParsedUnit {
    ParsedUnit {
        paragraph_id: id.into(),
        text: text.into(),
        section_path: vec!["Terms".into()],
        source: SentenceSource::Paragraph,
        page: 1,
        confidence: 0.95,
        geometry: None,
    }
}

fn main() {
    println!("--- Demonstrating document size limit policies ---");

    let cfg = IngestConfig {
        max_units_per_document: Some(2),
        ..Default::default()
    };

    println!("\n1. A document within the unit limit...");
    let ok = RawDocument {
        doc_id: String::new(),
        group_id: "tenant-a".into(),
        title: "Small doc".into(),
        received_at: None,
        units: vec![paragraph("p1", "First clause."), paragraph("p2", "Second clause.")],
    };
    match build_skeleton(ok, &cfg) {
        Ok(skeleton) => println!(" -> Success! {} chunks produced.", skeleton.chunks.len()),
        Err(err) => eprintln!(" -> Unexpected error: {err}"),
    }

    println!("\n2. A document exceeding the unit limit...");
    let too_big = RawDocument {
        doc_id: String::new(),
        group_id: "tenant-a".into(),
        title: "Large doc".into(),
        received_at: None,
        units: vec![
            paragraph("p1", "First clause."),
            paragraph("p2", "Second clause."),
            paragraph("p3", "Third clause."),
        ],
    };
    match build_skeleton(too_big, &cfg) {
        Ok(_) => eprintln!(" -> Unexpected success!"),
        Err(err) => println!(" -> Caught expected error: {err}"),
    }
}
