//! Filtered nearest-neighbor retrieval over the vector collection.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{GitaError, Result};
use crate::vectorstore::{SearchFilter, VectorStore};

/// Read-only retrieval: embed the query, search the collection with an
/// exact author filter, return up to `k` scored passages.
///
/// Zero matches (an author with no stored passages, or an empty
/// collection) is a normal outcome and comes back as an empty `Vec`,
/// never as an error.
///
/// Before the first search, the retriever validates the collection
/// manifest against its embedding provider exactly once per instance;
/// a model or dimensionality mismatch between build time and query
/// time fails fast instead of silently degrading relevance.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    collection: String,
    manifest_checked: OnceCell<()>,
}

impl Retriever {
    /// Create a retriever over the named collection.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self { embedder, store, collection: collection.into(), manifest_checked: OnceCell::new() }
    }

    /// Retrieve up to `k` passages for `query`, restricted to `author`.
    ///
    /// Results are ordered by decreasing similarity as returned by the
    /// store; ties keep the store's order (no re-sort here).
    ///
    /// # Errors
    ///
    /// - [`GitaError::Input`] if `k` is zero.
    /// - [`GitaError::Config`] if the collection was built with a
    ///   different embedding model.
    /// - [`GitaError::Dependency`] if the embedding call fails.
    /// - [`GitaError::ServiceUnavailable`] if the index is unreachable.
    pub async fn retrieve(&self, query: &str, author: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(GitaError::Input("k must be greater than zero".to_string()));
        }

        self.manifest_checked.get_or_try_init(|| self.check_manifest()).await?;

        let query_embedding = self.embedder.embed(query).await?;

        let filter = SearchFilter::by_author(author);
        let results =
            self.store.search(&self.collection, &query_embedding, &filter, k).await?;

        info!(
            collection = %self.collection,
            author,
            k,
            result_count = results.len(),
            "retrieved passages"
        );

        Ok(results)
    }

    /// One-shot manifest validation, run on the first retrieval.
    async fn check_manifest(&self) -> Result<()> {
        match self.store.get_manifest(&self.collection).await? {
            Some(manifest) => {
                if manifest.embedding_model != self.embedder.model_id()
                    || manifest.dimensions != self.embedder.dimensions()
                {
                    return Err(GitaError::Config(format!(
                        "collection '{}' was built with embedding model '{}' ({} dims) \
                         but this retriever uses '{}' ({} dims); rebuild the collection",
                        self.collection,
                        manifest.embedding_model,
                        manifest.dimensions,
                        self.embedder.model_id(),
                        self.embedder.dimensions(),
                    )));
                }
                info!(
                    collection = %self.collection,
                    model = %manifest.embedding_model,
                    chunk_count = manifest.chunk_count,
                    "collection manifest validated"
                );
                Ok(())
            }
            None => {
                // Collections built before manifests were recorded
                // still work, but the mismatch guard cannot run.
                warn!(
                    collection = %self.collection,
                    "collection has no manifest; embedding model consistency is unverified"
                );
                Ok(())
            }
        }
    }
}
