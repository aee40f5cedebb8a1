//! HTTP server exposing the Gita question-answering pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gita_rag::{
    Config, GeminiEmbeddingProvider, GeminiGenerativeModel, GitaEngine, QdrantVectorStore,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gita_server::{AppState, ElevenLabsClient, routes};

#[derive(Parser, Debug)]
#[command(name = "gita-server", about = "Ask the Bhagavad Gita, answered as Lord Krishna")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Qdrant gRPC endpoint.
    #[arg(long, default_value = "http://localhost:6334")]
    qdrant_url: String,

    /// Vector collection to query.
    #[arg(long, default_value = "gita_commentaries")]
    collection: String,

    /// Number of passages retrieved per question.
    #[arg(long, default_value_t = 5)]
    top_k: usize,

    /// Directory for generated MP3 files.
    #[arg(long, default_value = "audio")]
    audio_dir: PathBuf,

    /// Base URL used when building audio links in responses.
    #[arg(long, default_value = "http://localhost:8000")]
    public_base_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let gemini_api_key =
        std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;

    let embedder = Arc::new(GeminiEmbeddingProvider::new(gemini_api_key.clone())?);
    let model = Arc::new(GeminiGenerativeModel::new(gemini_api_key)?);
    let store = Arc::new(QdrantVectorStore::new(&args.qdrant_url)?);

    let config = Config::builder()
        .collection(args.collection.clone())
        .top_k(args.top_k)
        .build()?;
    let engine = Arc::new(GitaEngine::new(embedder, store, model, config));

    let tts = match std::env::var("ELEVENLABS_API_KEY") {
        Ok(key) => Some(Arc::new(ElevenLabsClient::new(key)?)),
        Err(_) => {
            info!("ELEVENLABS_API_KEY not set; audio generation disabled");
            None
        }
    };

    tokio::fs::create_dir_all(&args.audio_dir)
        .await
        .with_context(|| format!("failed to create audio dir {}", args.audio_dir.display()))?;

    let state = AppState {
        engine,
        tts,
        audio_dir: args.audio_dir,
        public_base_url: args.public_base_url.trim_end_matches('/').to_string(),
    };

    let app = routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, collection = %args.collection, "gita-server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
