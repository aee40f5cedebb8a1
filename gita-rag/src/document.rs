//! Data types for chunks, search results, and answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::corpus::CommentaryType;

/// Typed provenance carried by every chunk.
///
/// Unlike a free-form string map, the fields here are fixed at
/// normalization time, so a malformed record cannot silently corrupt
/// downstream filtering or prompt construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    /// Display name of the commentator. Retrieval filters on this
    /// field with exact, case-sensitive equality.
    pub author: String,
    pub chapter: u32,
    pub verse: u32,
    pub shloka_id: String,
    pub commentary_type: CommentaryType,
    /// The verse in its original Devanagari script.
    pub shloka_sanskrit: String,
    /// 0-based position within the parent commentary's split sequence.
    pub chunk_index: usize,
}

/// A bounded-length slice of one commentary with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier. Derived from the parent record at chunking
    /// time; replaced with a fresh UUID when loaded into the store.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until the
    /// embedding step runs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    /// Provenance metadata for filtering and prompt construction.
    pub metadata: ChunkMetadata,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk (embedding omitted).
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// The public projection of a retrieved passage, returned alongside
/// every answer so callers can see exactly what grounded it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDocument {
    pub shloka_id: String,
    pub shloka_sanskrit: String,
    /// The retrieved commentary text.
    pub commentary: String,
    pub author: String,
}

impl From<&Chunk> for SourceDocument {
    fn from(chunk: &Chunk) -> Self {
        Self {
            shloka_id: chunk.metadata.shloka_id.clone(),
            shloka_sanskrit: chunk.metadata.shloka_sanskrit.clone(),
            commentary: chunk.text.clone(),
            author: chunk.metadata.author.clone(),
        }
    }
}

/// The final response to one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Natural-language answer text.
    pub answer: String,
    /// The passages that grounded the answer, in retrieval order.
    /// Never filtered or reordered relative to the retrieval result.
    pub sources: Vec<SourceDocument>,
}

/// Metadata recorded when a collection is built and validated when it
/// is queried, so a build/query embedding-model mismatch fails fast
/// instead of silently degrading relevance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionManifest {
    /// Identifier of the embedding model used to build the collection.
    pub embedding_model: String,
    /// Dimensionality of the stored vectors.
    pub dimensions: usize,
    /// Number of chunks loaded by the build.
    pub chunk_count: usize,
    /// When the build completed.
    pub built_at: DateTime<Utc>,
}
