//! Vector store trait for storing and searching embedded chunks.

use async_trait::async_trait;

use crate::document::{Chunk, CollectionManifest, SearchResult};
use crate::error::Result;

/// Metadata restriction applied to a similarity search.
///
/// Retrieval only ever filters on the commentator's name, with exact,
/// case-sensitive equality; there is no fuzzy author matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Restrict results to chunks attributed to this author.
    pub author: Option<String>,
}

impl SearchFilter {
    /// A filter that matches everything.
    pub fn none() -> Self {
        Self::default()
    }

    /// Restrict to one author's passages.
    pub fn by_author(author: impl Into<String>) -> Self {
        Self { author: Some(author.into()) }
    }
}

/// A storage backend for embedded chunks with filtered similarity search.
///
/// Implementations manage named collections of [`Chunk`]s plus one
/// [`CollectionManifest`] per collection recording how the collection
/// was built.
///
/// # Example
///
/// ```rust,ignore
/// use gita_rag::{InMemoryVectorStore, SearchFilter, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("gita_commentaries", 768).await?;
/// store.upsert("gita_commentaries", &chunks).await?;
/// let filter = SearchFilter::by_author("Swami Sivananda");
/// let results = store.search("gita_commentaries", &query_embedding, &filter, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection, its manifest, and all its data.
    /// No-op if the collection does not exist.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Upsert chunks into a collection. Chunks must have embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Search for the `top_k` most similar chunks satisfying the filter.
    ///
    /// Returns results ordered by descending similarity score. Zero
    /// matches is a normal outcome, reported as an empty `Vec`.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        filter: &SearchFilter,
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Record the build manifest for a collection, replacing any
    /// previous manifest.
    async fn put_manifest(&self, collection: &str, manifest: &CollectionManifest) -> Result<()>;

    /// Fetch the build manifest for a collection, if one was recorded.
    async fn get_manifest(&self, collection: &str) -> Result<Option<CollectionManifest>>;
}
