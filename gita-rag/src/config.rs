//! Configuration for the retrieval and ingestion pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{GitaError, Result};

/// The default vector collection holding embedded commentary chunks.
pub const DEFAULT_COLLECTION: &str = "gita_commentaries";

/// Tuning parameters shared by the offline builder and the online engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of passages retrieved per query.
    pub top_k: usize,
    /// Number of texts sent to the embedding service per request.
    /// A throughput knob only; results are batch-size independent.
    pub embed_batch_size: usize,
    /// Number of chunks upserted into the vector store per request.
    pub insert_batch_size: usize,
    /// Name of the vector collection.
    pub collection: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            top_k: 5,
            embed_batch_size: 32,
            insert_batch_size: 256,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl Config {
    /// Create a new builder for constructing a [`Config`].
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of passages retrieved per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the embedding request batch size.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Set the vector store insert batch size.
    pub fn insert_batch_size(mut self, size: usize) -> Self {
        self.config.insert_batch_size = size;
        self
    }

    /// Set the vector collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Build the [`Config`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`GitaError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - either batch size is zero
    /// - the collection name is empty
    pub fn build(self) -> Result<Config> {
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(GitaError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(GitaError::Config("top_k must be greater than zero".to_string()));
        }
        if self.config.embed_batch_size == 0 || self.config.insert_batch_size == 0 {
            return Err(GitaError::Config("batch sizes must be greater than zero".to_string()));
        }
        if self.config.collection.is_empty() {
            return Err(GitaError::Config("collection name must not be empty".to_string()));
        }
        Ok(self.config)
    }
}
