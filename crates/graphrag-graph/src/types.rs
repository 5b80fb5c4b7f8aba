//! Node and edge payloads for the labeled property graph.
//!
//! The graph stores six node kinds (`Document`, `Section`, `TextChunk`,
//! `Sentence`, `Entity`, `Community`) and two families of edges. Deterministic
//! edges are written once, at ingestion, from parsed structure and are never
//! produced by similarity. Probabilistic edges (`RELATED_TO`,
//! `SEMANTICALLY_SIMILAR`) are written only by k-NN and always carry a
//! `{method, similarity}` payload so scoring code can never confuse the two
//! families.

use serde::{Deserialize, Serialize};

/// Width every stored embedding must share. A community summary embedded with
/// a different model than the query embedder is the historical failure mode
/// this constant guards against (see `GraphError::DimensionMismatch`).
pub const EMBEDDING_DIM: usize = 2048;

/// Stable identifier for any node in the graph. Opaque outside this crate.
pub type NodeId = String;

/// Tenant / security partition. Every node and every query carries one.
pub type GroupId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    Document,
    Section,
    TextChunk,
    Sentence,
    Entity,
    Community,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Document => "Document",
            NodeLabel::Section => "Section",
            NodeLabel::TextChunk => "TextChunk",
            NodeLabel::Sentence => "Sentence",
            NodeLabel::Entity => "Entity",
            NodeLabel::Community => "Community",
        }
    }
}

/// Upstream provenance of a sentence, preserved from the ingestion parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentenceSource {
    Paragraph,
    TableRow,
    FigureCaption,
    FigureDescription,
    Equation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<(f32, f32)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: NodeId,
    pub group_id: GroupId,
    pub title: String,
    pub page_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: NodeId,
    pub group_id: GroupId,
    pub document_id: NodeId,
    pub title: String,
    /// Materialised ancestor path, e.g. "Terms > Payment > Schedule".
    pub path_key: String,
    pub parent_section_id: Option<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    pub id: NodeId,
    pub group_id: GroupId,
    pub document_id: NodeId,
    pub section_id: Option<NodeId>,
    pub text: String,
    pub embedding_v2: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    pub id: NodeId,
    pub group_id: GroupId,
    pub chunk_id: NodeId,
    pub paragraph_id: String,
    pub section_path: String,
    pub parent_paragraph_text: String,
    pub page: u32,
    pub confidence: f32,
    pub char_offset: u32,
    pub char_len: u32,
    pub geometry: Vec<Polygon>,
    pub embedding_v2: Vec<f32>,
    pub source: SentenceSource,
    pub text: String,
    pub next_sentence_id: Option<NodeId>,
    pub prev_sentence_id: Option<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: NodeId,
    pub group_id: GroupId,
    pub canonical_name: String,
    pub aliases: Vec<String>,
    pub embedding_v2: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: NodeId,
    pub group_id: GroupId,
    pub summary: String,
    pub summary_embedding_v2: Vec<f32>,
    pub member_entity_ids: Vec<NodeId>,
}

/// Any node kind, tagged for storage in a single KV backend keyed by
/// `(group_id, node_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "label")]
pub enum Node {
    Document(Document),
    Section(Section),
    TextChunk(TextChunk),
    Sentence(Sentence),
    Entity(Entity),
    Community(Community),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Document(n) => &n.id,
            Node::Section(n) => &n.id,
            Node::TextChunk(n) => &n.id,
            Node::Sentence(n) => &n.id,
            Node::Entity(n) => &n.id,
            Node::Community(n) => &n.id,
        }
    }

    pub fn group_id(&self) -> &str {
        match self {
            Node::Document(n) => &n.group_id,
            Node::Section(n) => &n.group_id,
            Node::TextChunk(n) => &n.group_id,
            Node::Sentence(n) => &n.group_id,
            Node::Entity(n) => &n.group_id,
            Node::Community(n) => &n.group_id,
        }
    }

    pub fn label(&self) -> NodeLabel {
        match self {
            Node::Document(_) => NodeLabel::Document,
            Node::Section(_) => NodeLabel::Section,
            Node::TextChunk(_) => NodeLabel::TextChunk,
            Node::Sentence(_) => NodeLabel::Sentence,
            Node::Entity(_) => NodeLabel::Entity,
            Node::Community(_) => NodeLabel::Community,
        }
    }
}

/// Deterministic edge kinds: created only from parsed structure, exact and
/// complete, never emitted by similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeterministicEdgeKind {
    HasSection,
    InSection,
    InDocument,
    PartOf,
    Next,
    SubsectionOf,
    BelongsTo,
    Mentions,
}

/// Probabilistic edge kinds: created only by k-NN, bounded by the sparsity
/// budget, and carry a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbabilisticEdgeKind {
    RelatedTo,
    SemanticallySimilar,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeterministicEdge {
    pub kind: DeterministicEdgeKind,
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimilarityMethod {
    CosineKnn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbabilisticEdge {
    pub kind: ProbabilisticEdgeKind,
    pub from: NodeId,
    pub to: NodeId,
    pub method: SimilarityMethod,
    pub similarity: f32,
}
