//! Retrieval-augmented answers from Bhagavad Gita commentaries, in the
//! voice of Lord Krishna.
//!
//! The crate is split along the pipeline:
//!
//! - **Offline**: [`corpus`] normalizes per-verse source files into
//!   commentary records, [`chunking`] splits them into overlapping
//!   windows, [`artifacts`] persists the intermediate files, and
//!   [`ingest`] embeds the chunks and rebuilds the vector collection.
//! - **Online**: [`retriever`] performs author-filtered similarity
//!   search and [`synthesize`] turns retrieved passages into a
//!   grounded, persona-constrained answer. [`engine`] composes both
//!   behind [`GitaEngine`].
//!
//! External collaborators sit behind traits: [`EmbeddingProvider`] and
//! [`GenerativeModel`] (Gemini implementations in [`gemini`]) and
//! [`VectorStore`] (Qdrant for production, an in-memory store for
//! development and tests).

pub mod artifacts;
pub mod chunking;
pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod gemini;
pub mod generation;
pub mod inmemory;
pub mod ingest;
pub mod qdrant;
pub mod retriever;
pub mod synthesize;
pub mod vectorstore;

pub use chunking::RecursiveChunker;
pub use config::{Config, ConfigBuilder, DEFAULT_COLLECTION};
pub use corpus::{CommentaryRecord, CommentaryType, NormalizeSummary, VerseRecord};
pub use document::{
    Answer, Chunk, ChunkMetadata, CollectionManifest, SearchResult, SourceDocument,
};
pub use embedding::EmbeddingProvider;
pub use engine::GitaEngine;
pub use error::{GitaError, Result};
pub use gemini::{GeminiEmbeddingProvider, GeminiGenerativeModel};
pub use generation::GenerativeModel;
pub use inmemory::InMemoryVectorStore;
pub use ingest::{FailedBatch, IndexBuilder, IngestSummary};
pub use qdrant::QdrantVectorStore;
pub use retriever::Retriever;
pub use synthesize::{OutputLanguage, PromptTemplate, Synthesizer};
pub use vectorstore::{SearchFilter, VectorStore};
