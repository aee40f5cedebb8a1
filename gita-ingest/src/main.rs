//! Offline corpus pipeline for the Gita question-answering service.
//!
//! Four stages, each reading the previous stage's artifact:
//! normalize (per-verse JSON to commentary records), chunk, embed,
//! and load (destructive collection rebuild in Qdrant).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gita_rag::{
    Config, GeminiEmbeddingProvider, IndexBuilder, QdrantVectorStore, RecursiveChunker,
    artifacts, corpus, ingest,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "gita-ingest", about = "Build the Gita commentary vector index")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flatten per-verse source files into commentary records.
    Normalize {
        /// Directory of per-verse JSON files.
        #[arg(long)]
        data_dir: PathBuf,
        /// Output records file (JSON).
        #[arg(long)]
        out: PathBuf,
    },
    /// Split commentary records into bounded, overlapping chunks.
    Chunk {
        /// Records file produced by `normalize`.
        #[arg(long)]
        input: PathBuf,
        /// Output chunks file (JSON).
        #[arg(long)]
        out: PathBuf,
        /// Maximum chunk size in characters.
        #[arg(long, default_value_t = 1000)]
        chunk_size: usize,
        /// Overlap between consecutive chunks in characters.
        #[arg(long, default_value_t = 100)]
        chunk_overlap: usize,
    },
    /// Embed every chunk with Gemini (requires GEMINI_API_KEY).
    Embed {
        /// Chunks file produced by `chunk`.
        #[arg(long)]
        chunks: PathBuf,
        /// Output embedding matrix file.
        #[arg(long)]
        out: PathBuf,
        /// Number of texts per embedding request.
        #[arg(long, default_value_t = 32)]
        batch_size: usize,
    },
    /// Drop and rebuild the vector collection from the artifacts.
    Load {
        /// Chunks file produced by `chunk`.
        #[arg(long)]
        chunks: PathBuf,
        /// Embedding matrix produced by `embed`.
        #[arg(long)]
        embeddings: PathBuf,
        /// Qdrant gRPC endpoint.
        #[arg(long, default_value = "http://localhost:6334")]
        qdrant_url: String,
        /// Target collection name.
        #[arg(long, default_value = "gita_commentaries")]
        collection: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Command::Normalize { data_dir, out } => {
            let (records, summary) = corpus::normalize_dir(&data_dir)?;
            artifacts::write_records(&out, &records)?;
            println!(
                "normalized {} files ({} skipped) into {} records -> {}",
                summary.files_total,
                summary.files_skipped,
                summary.records,
                out.display()
            );
        }
        Command::Chunk { input, out, chunk_size, chunk_overlap } => {
            // Reuse config validation for the size/overlap pair.
            let config =
                Config::builder().chunk_size(chunk_size).chunk_overlap(chunk_overlap).build()?;
            let chunker = RecursiveChunker::new(config.chunk_size, config.chunk_overlap);

            let records = artifacts::read_records(&input)?;
            let chunks: Vec<_> =
                records.iter().flat_map(|r| chunker.chunk_commentary(r)).collect();
            artifacts::write_chunks(&out, &chunks)?;
            println!(
                "chunked {} records into {} chunks -> {}",
                records.len(),
                chunks.len(),
                out.display()
            );
        }
        Command::Embed { chunks, out, batch_size } => {
            let api_key =
                std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;
            let embedder = GeminiEmbeddingProvider::new(api_key)?;
            let config = Config::builder().embed_batch_size(batch_size).build()?;

            let chunk_list = artifacts::read_chunks(&chunks)?;
            let matrix =
                ingest::embed_chunks(&embedder, &chunk_list, config.embed_batch_size).await?;
            artifacts::write_matrix(&out, &matrix)?;
            println!(
                "embedded {} chunks ({} dims) -> {}",
                matrix.len(),
                matrix.first().map(Vec::len).unwrap_or(0),
                out.display()
            );
        }
        Command::Load { chunks, embeddings, qdrant_url, collection } => {
            let api_key =
                std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;
            let embedder = Arc::new(GeminiEmbeddingProvider::new(api_key)?);
            let store = Arc::new(QdrantVectorStore::new(&qdrant_url)?);
            let config = Config::builder().collection(collection.clone()).build()?;

            let (chunk_list, matrix) = artifacts::read_aligned(&chunks, &embeddings)?;
            let builder = IndexBuilder::new(embedder, store, config);
            let summary = builder.rebuild_collection(&collection, &chunk_list, &matrix).await?;

            println!(
                "loaded {}/{} chunks into '{}'",
                summary.inserted, summary.chunks_total, collection
            );
            for failed in &summary.failed_batches {
                eprintln!(
                    "batch {} ({}..{}) failed: {}",
                    failed.batch_index, failed.first_id, failed.last_id, failed.message
                );
            }
            if !summary.is_complete() {
                anyhow::bail!("load finished with failed batches; rerun after fixing the cause");
            }
        }
    }

    Ok(())
}
