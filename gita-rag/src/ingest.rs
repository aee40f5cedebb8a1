//! Embedding store builder: embed chunk batches and (re)build the
//! vector collection.
//!
//! The rebuild is destructive-and-replace by design: the existing
//! collection is dropped and recreated, so rebuilds are idempotent and
//! never leave duplicate or stale entries. It runs only as an explicit
//! administrative operation (the `gita-ingest load` command), never as
//! a side effect of normal query traffic.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::document::{Chunk, CollectionManifest};
use crate::embedding::EmbeddingProvider;
use crate::error::{GitaError, Result};
use crate::vectorstore::VectorStore;

/// One insert batch that failed during a rebuild, with enough context
/// to resume or retry.
#[derive(Debug, Clone)]
pub struct FailedBatch {
    /// 0-based index of the batch in the insert sequence.
    pub batch_index: usize,
    /// Id of the first chunk in the failed batch.
    pub first_id: String,
    /// Id of the last chunk in the failed batch.
    pub last_id: String,
    /// The error reported by the store.
    pub message: String,
}

/// Counts reported after a collection rebuild so partial data loss is
/// visible to the operator.
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    /// Number of chunks submitted.
    pub chunks_total: usize,
    /// Number of chunks actually inserted.
    pub inserted: usize,
    /// Insert batches that failed and were skipped.
    pub failed_batches: Vec<FailedBatch>,
}

impl IngestSummary {
    /// Whether every submitted chunk made it into the collection.
    pub fn is_complete(&self) -> bool {
        self.failed_batches.is_empty() && self.inserted == self.chunks_total
    }
}

/// Embed every chunk's text, in order, batching requests for
/// throughput. The batch size is a tuning parameter only; output row
/// order always matches input chunk order.
pub async fn embed_chunks(
    embedder: &dyn EmbeddingProvider,
    chunks: &[Chunk],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut rows = Vec::with_capacity(chunks.len());
    let total_batches = chunks.len().div_ceil(batch_size);

    for (batch_index, batch) in chunks.chunks(batch_size).enumerate() {
        let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts).await.map_err(|e| {
            error!(batch_index, total_batches, error = %e, "embedding batch failed");
            e
        })?;
        rows.extend(embeddings);
        info!(
            batch_index = batch_index + 1,
            total_batches,
            embedded = rows.len(),
            "embedded chunk batch"
        );
    }

    Ok(rows)
}

/// Builds the durable vector collection from embedded chunks.
pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    config: Config,
}

impl IndexBuilder {
    /// Create a builder from its collaborators.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        config: Config,
    ) -> Self {
        Self { embedder, store, config }
    }

    /// Embed every chunk's text with this builder's provider and
    /// configured batch size. See [`embed_chunks`].
    pub async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        embed_chunks(self.embedder.as_ref(), chunks, self.config.embed_batch_size).await
    }

    /// Drop and recreate the named collection, then insert every chunk
    /// with a freshly generated unique id and its embedding row.
    ///
    /// A failed insert batch is logged with its batch index and id
    /// range, skipped, and reported in the summary; remaining batches
    /// still run. The collection manifest is written last, after the
    /// inserts.
    ///
    /// # Errors
    ///
    /// Returns [`GitaError::Ingestion`] if the chunk and embedding
    /// counts disagree, or a store error if the collection itself
    /// cannot be recreated.
    pub async fn rebuild_collection(
        &self,
        name: &str,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<IngestSummary> {
        if chunks.len() != embeddings.len() {
            return Err(GitaError::Ingestion {
                stage: "load".to_string(),
                message: format!(
                    "chunk/embedding count mismatch: {} chunks, {} embeddings",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        warn!(collection = name, "dropping and rebuilding vector collection");
        self.store.delete_collection(name).await?;
        self.store.create_collection(name, self.embedder.dimensions()).await?;

        // Fresh globally unique ids; the provisional chunker-derived
        // ids are only meaningful inside the artifact files.
        let entries: Vec<Chunk> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Chunk {
                id: Uuid::new_v4().to_string(),
                text: chunk.text.clone(),
                embedding: embedding.clone(),
                metadata: chunk.metadata.clone(),
            })
            .collect();

        let mut summary = IngestSummary { chunks_total: entries.len(), ..Default::default() };

        for (batch_index, batch) in entries.chunks(self.config.insert_batch_size).enumerate() {
            match self.store.upsert(name, batch).await {
                Ok(()) => summary.inserted += batch.len(),
                Err(e) => {
                    let first_id = batch.first().map(|c| c.id.clone()).unwrap_or_default();
                    let last_id = batch.last().map(|c| c.id.clone()).unwrap_or_default();
                    error!(
                        collection = name,
                        batch_index,
                        first_id = %first_id,
                        last_id = %last_id,
                        error = %e,
                        "insert batch failed, skipping"
                    );
                    summary.failed_batches.push(FailedBatch {
                        batch_index,
                        first_id,
                        last_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        let manifest = CollectionManifest {
            embedding_model: self.embedder.model_id().to_string(),
            dimensions: self.embedder.dimensions(),
            chunk_count: summary.inserted,
            built_at: chrono::Utc::now(),
        };
        self.store.put_manifest(name, &manifest).await?;

        info!(
            collection = name,
            chunks_total = summary.chunks_total,
            inserted = summary.inserted,
            failed_batches = summary.failed_batches.len(),
            model = %manifest.embedding_model,
            "collection rebuild finished"
        );

        Ok(summary)
    }
}
