//! Core data model for the deterministic document skeleton.
//!
//! These types describe both the inbound stream (already-parsed paragraphs,
//! tables, and figures with geometry — OCR and layout extraction are an
//! external collaborator, never performed here) and the skeleton nodes this
//! crate derives from it: [`Document`], [`Section`], [`TextChunk`], and
//! [`Sentence`]. Entity and Community nodes are out of scope for this crate;
//! they are materialized downstream from the chunks and sentences produced
//! here.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bounding polygon on a page, carried through from the upstream parser.
/// Opaque to this crate beyond storage; used by citation UIs for highlighting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Geometry {
    pub page: u32,
    /// Flattened (x, y) polygon points in page-relative coordinates.
    pub polygon: Vec<(f32, f32)>,
}

/// The kind of upstream extraction unit a sentence was derived from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SentenceSource {
    Paragraph,
    TableRow,
    FigureCaption,
    FigureDescription,
    Equation,
}

/// One already-parsed extraction unit arriving from the upstream document
/// parser. A `ParsedUnit` carries enough structural context (section path,
/// page, geometry, parser confidence) that this crate never has to
/// re-derive it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedUnit {
    /// Upstream-assigned paragraph/row/figure id, stable across re-runs.
    pub paragraph_id: String,
    /// Raw text as extracted; normalized by this crate before embedding.
    pub text: String,
    /// Section titles from the document root down to this unit's section,
    /// e.g. `["Terms", "Payment", "Schedule"]`.
    pub section_path: Vec<String>,
    pub source: SentenceSource,
    pub page: u32,
    /// Parser-reported confidence in `[0, 1]`; preserved verbatim, never
    /// recomputed.
    pub confidence: f32,
    pub geometry: Option<Geometry>,
}

/// A raw ingest request: one document's ordered stream of parsed units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawDocument {
    /// Upstream-provided id; if empty a deterministic id is derived from
    /// `group_id` + `title` (see [`crate::config::IngestConfig`]).
    pub doc_id: String,
    pub group_id: String,
    pub title: String,
    pub received_at: Option<DateTime<Utc>>,
    /// Units in document reading order. Ordering is load-bearing: it is the
    /// sole source of `NEXT` edges and paragraph grouping.
    pub units: Vec<ParsedUnit>,
}

/// A source file. Immutable once created; a `Document` owns its `Section`s,
/// which own their `Chunk`s, which own their `Sentence`s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub group_id: String,
    pub title: String,
    pub page_count: u32,
    pub created_at: DateTime<Utc>,
}

/// A logical region, nested arbitrarily deep. `path_key` is the materialised
/// ancestor path (`"Terms > Payment > Schedule"`) used as `section_path` on
/// every sentence beneath it. Titles are metadata only — never embedded
/// independently; only the structural label baked into sentence/chunk
/// embeddings carries the title text into vector space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: String,
    pub document_id: String,
    pub title: String,
    pub path_key: String,
    pub parent_section_id: Option<String>,
    pub depth: u32,
}

/// A contiguous extraction unit, target 500-700 tokens. Every chunk belongs
/// to exactly one document and at most one section (top-level prose with no
/// enclosing heading has `section_id = None`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextChunk {
    pub id: String,
    pub document_id: String,
    pub section_id: Option<String>,
    pub group_id: String,
    pub raw_text: String,
    /// Populated by the embedding stage; `None` until then.
    pub embedding_v2: Option<Vec<f32>>,
    /// Ordinal within the document, used to derive `NEXT` between chunks'
    /// boundary sentences when not already adjacent.
    pub ordinal: u32,
}

/// The precision retrieval unit. Exactly one `PART_OF` edge to its chunk;
/// at most one `NEXT` successor and predecessor, in reading order within
/// the chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sentence {
    pub id: String,
    pub chunk_id: String,
    pub parent_paragraph_id: String,
    pub group_id: String,
    pub text: String,
    pub section_path: String,
    pub parent_paragraph_text: String,
    pub page: u32,
    pub confidence: f32,
    pub char_offset: u32,
    pub char_len: u32,
    pub geometry: Option<Geometry>,
    pub source: SentenceSource,
    /// Populated by the embedding stage; `None` until then.
    pub embedding_v2: Option<Vec<f32>>,
    pub prev_sentence_id: Option<String>,
    pub next_sentence_id: Option<String>,
    /// Ordinal within the whole document, stable reading order.
    pub ordinal: u32,
}

/// One deterministic structural edge kind. Created only from parsed
/// structure; exact and complete; never emitted by similarity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeterministicEdgeKind {
    HasSection,
    InSection,
    InDocument,
    PartOf,
    Next,
    SubsectionOf,
}

/// A deterministic edge between two skeleton node ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeterministicEdge {
    pub kind: DeterministicEdgeKind,
    pub from: String,
    pub to: String,
}

/// The complete skeleton derived from one [`RawDocument`]: nodes plus their
/// deterministic edges, ready to be handed to the graph store. Vector
/// fields on chunks/sentences are `None` here — embedding is a separate
/// pipeline stage (see `graphrag-embedding`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DocumentSkeleton {
    pub document: Option<Document>,
    pub sections: Vec<Section>,
    pub chunks: Vec<TextChunk>,
    pub sentences: Vec<Sentence>,
    pub edges: Vec<DeterministicEdge>,
}
