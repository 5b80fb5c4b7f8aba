//! Document skeleton construction.
//!
//! Takes an already-parsed [`RawDocument`] — a document's ordered stream of
//! paragraphs, table rows, and figure captions, each carrying its own
//! section path, page, and geometry from an upstream layout parser — and
//! derives the deterministic `Document` / `Section` / `TextChunk` /
//! `Sentence` hierarchy plus the structural edges between them. This crate
//! never performs OCR, layout detection, or embedding; those are separate
//! pipeline stages.
//!
//! ## Example
//!
//! ```
//! use graphrag_ingest::{build_skeleton, IngestConfig, ParsedUnit, RawDocument, SentenceSource};
//!
//! let doc = RawDocument {
//!     doc_id: String::new(),
//!     group_id: "tenant-a".into(),
//!     title: "Sample Contract".into(),
//!     received_at: None,
//!     units: vec![ParsedUnit {
//!         paragraph_id: "p1".into(),
//!         text: "The total was due net thirty. Payment follows by wire.".into(),
//!         section_path: vec!["Terms".into(), "Payment".into()],
//!         source: SentenceSource::Paragraph,
//!         page: 1,
//!         confidence: 0.98,
//!         geometry: None,
//!     }],
//! };
//!
//! let skeleton = build_skeleton(doc, &IngestConfig::default()).unwrap();
//! assert_eq!(skeleton.sentences.len(), 2);
//! assert_eq!(skeleton.sections.len(), 2); // "Terms" and "Terms > Payment"
//! ```

mod config;
mod error;
mod types;

use std::collections::HashMap;

use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

pub use crate::config::{ConfigError, IngestConfig};
pub use crate::error::IngestError;
pub use crate::types::{
    DeterministicEdge, DeterministicEdgeKind, Document, DocumentSkeleton, Geometry, ParsedUnit,
    RawDocument, Section, Sentence, SentenceSource, TextChunk,
};

/// Whitespace-token count, used only to size chunks; not a tokenizer vocabulary.
fn approx_token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn derive_doc_id(cfg: &IngestConfig, group_id: &str, title: &str) -> String {
    let material = format!("{group_id}\0{title}");
    Uuid::new_v5(&cfg.doc_id_namespace, material.as_bytes()).to_string()
}

fn section_id(doc_id: &str, path_key: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{doc_id}\0section\0{path_key}").as_bytes())
        .to_string()
}

fn chunk_id(doc_id: &str, ordinal: u32) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{doc_id}\0chunk\0{ordinal}").as_bytes()).to_string()
}

fn sentence_id(chunk_id: &str, ordinal: u32) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{chunk_id}\0sentence\0{ordinal}").as_bytes())
        .to_string()
}

/// Ensures every prefix of `path` has a [`Section`] node, creating missing
/// ones as it walks down, and returns the id of the deepest (leaf) section.
/// Sections are deduplicated by `path_key` — the same `["Terms", "Payment"]`
/// path seen twice yields one `Section` node, not two.
fn resolve_section_path(
    doc_id: &str,
    path: &[String],
    sections: &mut Vec<Section>,
    section_edges: &mut Vec<DeterministicEdge>,
    by_path: &mut HashMap<String, String>,
) -> Option<String> {
    let mut parent_id: Option<String> = None;
    let mut accumulated: Vec<&str> = Vec::with_capacity(path.len());

    for (depth, title) in path.iter().enumerate() {
        accumulated.push(title.as_str());
        let path_key = accumulated.join(" > ");

        let id = if let Some(existing) = by_path.get(&path_key) {
            existing.clone()
        } else {
            let id = section_id(doc_id, &path_key);
            sections.push(Section {
                id: id.clone(),
                document_id: doc_id.to_string(),
                title: title.clone(),
                path_key: path_key.clone(),
                parent_section_id: parent_id.clone(),
                depth: depth as u32,
            });
            match &parent_id {
                Some(parent) => section_edges.push(DeterministicEdge {
                    kind: DeterministicEdgeKind::SubsectionOf,
                    from: id.clone(),
                    to: parent.clone(),
                }),
                None => section_edges.push(DeterministicEdge {
                    kind: DeterministicEdgeKind::HasSection,
                    from: doc_id.to_string(),
                    to: id.clone(),
                }),
            }
            by_path.insert(path_key, id.clone());
            id
        };

        parent_id = Some(id);
    }

    parent_id
}

/// Builds the deterministic skeleton for one document. Chunk boundaries
/// always fall between paragraphs (a paragraph is never split across two
/// chunks), and sentence order within a chunk mirrors the upstream unit
/// order exactly.
pub fn build_skeleton(raw: RawDocument, cfg: &IngestConfig) -> Result<DocumentSkeleton, IngestError> {
    cfg.validate().map_err(|e| IngestError::InvalidMetadata(e.to_string()))?;

    if raw.group_id.trim().is_empty() {
        return Err(IngestError::MissingGroupId);
    }
    if raw.units.is_empty() {
        return Err(IngestError::EmptyDocument);
    }
    if let Some(limit) = cfg.max_units_per_document {
        if raw.units.len() > limit {
            return Err(IngestError::DocumentTooLarge(format!(
                "{} units exceeds limit of {limit}",
                raw.units.len()
            )));
        }
    }

    let doc_id = if raw.doc_id.trim().is_empty() {
        derive_doc_id(cfg, &raw.group_id, &raw.title)
    } else {
        raw.doc_id.clone()
    };

    let mut sections = Vec::new();
    let mut edges = Vec::new();
    let mut section_by_path: HashMap<String, String> = HashMap::new();

    let mut chunks = Vec::new();
    let mut sentences = Vec::new();
    let mut max_page = 0u32;
    let mut chunk_ordinal = 0u32;
    let mut sentence_ordinal = 0u32;
    let mut prev_sentence_id: Option<String> = None;

    let mut current_units: Vec<&ParsedUnit> = Vec::new();
    let mut current_tokens = 0usize;
    let mut current_section_id: Option<String> = None;

    let mut flush_chunk =
        |units: &mut Vec<&ParsedUnit>,
         section_id: Option<String>,
         chunks: &mut Vec<TextChunk>,
         sentences: &mut Vec<Sentence>,
         edges: &mut Vec<DeterministicEdge>,
         chunk_ordinal: &mut u32,
         sentence_ordinal: &mut u32,
         prev_sentence_id: &mut Option<String>| {
        if units.is_empty() {
            return;
        }
        let id = chunk_id(&doc_id, *chunk_ordinal);
        let mut raw_text = String::new();
        let mut char_cursor: u32 = 0;

        for unit in units.iter() {
            if !raw_text.is_empty() {
                raw_text.push(' ');
                char_cursor += 1;
            }
            let unit_start = char_cursor;
            raw_text.push_str(&unit.text);
            char_cursor += unit.text.chars().count() as u32;

            let section_path = unit.section_path.join(" > ");
            let mut local_offset = unit_start;
            for sentence_text in unit.text.unicode_sentences() {
                let trimmed = sentence_text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let this_id = sentence_id(&id, *sentence_ordinal);
                if let Some(prev) = prev_sentence_id.as_ref() {
                    edges.push(DeterministicEdge {
                        kind: DeterministicEdgeKind::Next,
                        from: prev.clone(),
                        to: this_id.clone(),
                    });
                }
                edges.push(DeterministicEdge {
                    kind: DeterministicEdgeKind::PartOf,
                    from: this_id.clone(),
                    to: id.clone(),
                });

                sentences.push(Sentence {
                    id: this_id.clone(),
                    chunk_id: id.clone(),
                    parent_paragraph_id: unit.paragraph_id.clone(),
                    group_id: String::new(), // filled by caller post-pass below
                    text: trimmed.to_string(),
                    section_path: section_path.clone(),
                    parent_paragraph_text: unit.text.clone(),
                    page: unit.page,
                    confidence: unit.confidence,
                    char_offset: local_offset,
                    char_len: trimmed.chars().count() as u32,
                    geometry: unit.geometry.clone(),
                    source: unit.source,
                    embedding_v2: None,
                    prev_sentence_id: prev_sentence_id.clone(),
                    next_sentence_id: None,
                    ordinal: *sentence_ordinal,
                });

                *prev_sentence_id = Some(this_id);
                *sentence_ordinal += 1;
                local_offset += trimmed.chars().count() as u32 + 1;
            }
        }

        edges.push(DeterministicEdge {
            kind: match &section_id {
                Some(_) => DeterministicEdgeKind::InSection,
                None => DeterministicEdgeKind::InDocument,
            },
            from: id.clone(),
            to: section_id.clone().unwrap_or_else(|| doc_id.clone()),
        });

        chunks.push(TextChunk {
            id,
            document_id: doc_id.clone(),
            section_id,
            group_id: String::new(),
            raw_text,
            embedding_v2: None,
            ordinal: *chunk_ordinal,
        });
        *chunk_ordinal += 1;
        units.clear();
    };

    for unit in &raw.units {
        max_page = max_page.max(unit.page);

        let leaf = resolve_section_path(
            &doc_id,
            &unit.section_path,
            &mut sections,
            &mut edges,
            &mut section_by_path,
        );

        // A section change always starts a new chunk: a chunk's sentences
        // never straddle two sections.
        if leaf != current_section_id && !current_units.is_empty() {
            flush_chunk(
                &mut current_units,
                current_section_id.take(),
                &mut chunks,
                &mut sentences,
                &mut edges,
                &mut chunk_ordinal,
                &mut sentence_ordinal,
                &mut prev_sentence_id,
            );
            current_tokens = 0;
        }
        current_section_id = leaf;

        let unit_tokens = approx_token_count(&unit.text);
        if current_tokens + unit_tokens > cfg.chunk_max_tokens && !current_units.is_empty() {
            flush_chunk(
                &mut current_units,
                current_section_id.clone(),
                &mut chunks,
                &mut sentences,
                &mut edges,
                &mut chunk_ordinal,
                &mut sentence_ordinal,
                &mut prev_sentence_id,
            );
            current_tokens = 0;
        }

        if unit_tokens > cfg.chunk_max_tokens {
            warn!(paragraph_id = %unit.paragraph_id, unit_tokens, max = cfg.chunk_max_tokens, "paragraph exceeds chunk_max_tokens, kept whole");
        }

        current_units.push(unit);
        current_tokens += unit_tokens;

        if current_tokens >= cfg.chunk_target_tokens {
            flush_chunk(
                &mut current_units,
                current_section_id.clone(),
                &mut chunks,
                &mut sentences,
                &mut edges,
                &mut chunk_ordinal,
                &mut sentence_ordinal,
                &mut prev_sentence_id,
            );
            current_tokens = 0;
        }
    }
    flush_chunk(
        &mut current_units,
        current_section_id.clone(),
        &mut chunks,
        &mut sentences,
        &mut edges,
        &mut chunk_ordinal,
        &mut sentence_ordinal,
        &mut prev_sentence_id,
    );

    for chunk in chunks.iter_mut() {
        chunk.group_id = raw.group_id.clone();
    }
    for sentence in sentences.iter_mut() {
        sentence.group_id = raw.group_id.clone();
    }

    let document = Document {
        id: doc_id,
        group_id: raw.group_id,
        title: raw.title,
        page_count: max_page + 1,
        created_at: raw.received_at.unwrap_or_else(chrono::Utc::now),
    };

    Ok(DocumentSkeleton {
        document: Some(document),
        sections,
        chunks,
        sentences,
        edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(paragraph_id: &str, text: &str, path: &[&str], page: u32) -> ParsedUnit {
        ParsedUnit {
            paragraph_id: paragraph_id.into(),
            text: text.into(),
            section_path: path.iter().map(|s| s.to_string()).collect(),
            source: SentenceSource::Paragraph,
            page,
            confidence: 0.95,
            geometry: None,
        }
    }

    fn doc(units: Vec<ParsedUnit>) -> RawDocument {
        RawDocument {
            doc_id: String::new(),
            group_id: "tenant-a".into(),
            title: "Sample".into(),
            received_at: None,
            units,
        }
    }

    #[test]
    fn builds_sentences_in_document_order() {
        let skeleton = build_skeleton(
            doc(vec![unit(
                "p1",
                "The total was due net thirty. Payment follows by wire.",
                &["Terms", "Payment"],
                1,
            )]),
            &IngestConfig::default(),
        )
        .unwrap();
        assert_eq!(skeleton.sentences.len(), 2);
        assert_eq!(skeleton.sentences[0].next_sentence_id, None); // linked via NEXT edge, not the field itself here
    }

    #[test]
    fn dedupes_shared_section_path() {
        let skeleton = build_skeleton(
            doc(vec![
                unit("p1", "First clause.", &["Terms", "Payment"], 1),
                unit("p2", "Second clause.", &["Terms", "Payment"], 1),
            ]),
            &IngestConfig::default(),
        )
        .unwrap();
        assert_eq!(skeleton.sections.len(), 2); // "Terms", "Terms > Payment"
    }

    #[test]
    fn section_change_starts_new_chunk() {
        let skeleton = build_skeleton(
            doc(vec![
                unit("p1", "First section text.", &["Terms"], 1),
                unit("p2", "Second section text.", &["Definitions"], 1),
            ]),
            &IngestConfig::default(),
        )
        .unwrap();
        assert_eq!(skeleton.chunks.len(), 2);
    }

    #[test]
    fn empty_document_rejected() {
        let err = build_skeleton(doc(vec![]), &IngestConfig::default()).unwrap_err();
        assert!(matches!(err, IngestError::EmptyDocument));
    }

    #[test]
    fn missing_group_id_rejected() {
        let mut raw = doc(vec![unit("p1", "text.", &["Terms"], 1)]);
        raw.group_id = String::new();
        let err = build_skeleton(raw, &IngestConfig::default()).unwrap_err();
        assert!(matches!(err, IngestError::MissingGroupId));
    }

    #[test]
    fn doc_id_derivation_is_deterministic() {
        let cfg = IngestConfig::default();
        let a = build_skeleton(doc(vec![unit("p1", "text.", &["Terms"], 1)]), &cfg).unwrap();
        let b = build_skeleton(doc(vec![unit("p1", "text.", &["Terms"], 1)]), &cfg).unwrap();
        assert_eq!(a.document.unwrap().id, b.document.unwrap().id);
    }

    #[test]
    fn oversized_document_rejected() {
        let cfg = IngestConfig {
            max_units_per_document: Some(1),
            ..Default::default()
        };
        let raw = doc(vec![
            unit("p1", "one.", &["Terms"], 1),
            unit("p2", "two.", &["Terms"], 1),
        ]);
        let err = build_skeleton(raw, &cfg).unwrap_err();
        assert!(matches!(err, IngestError::DocumentTooLarge(_)));
    }

    #[test]
    fn chunk_target_tokens_splits_long_documents() {
        let cfg = IngestConfig {
            chunk_target_tokens: 3,
            chunk_max_tokens: 10,
            ..Default::default()
        };
        let raw = doc(vec![
            unit("p1", "one two three", &["Terms"], 1),
            unit("p2", "four five six", &["Terms"], 1),
        ]);
        let skeleton = build_skeleton(raw, &cfg).unwrap();
        assert_eq!(skeleton.chunks.len(), 2);
    }
}
