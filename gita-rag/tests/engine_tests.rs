//! End-to-end tests over the in-memory store with mock providers:
//! ingest a small corpus, then exercise the ask path.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use gita_rag::corpus::CommentaryType;
use gita_rag::{
    Chunk, ChunkMetadata, CollectionManifest, CommentaryRecord, Config, EmbeddingProvider,
    GenerativeModel, GitaEngine, GitaError, InMemoryVectorStore, IndexBuilder, OutputLanguage,
    RecursiveChunker, Retriever, SearchFilter, SearchResult, Synthesizer, VectorStore,
};

// ---------------------------------------------------------------------------
// Deterministic hash-based mock embedder
// ---------------------------------------------------------------------------

struct MockEmbeddingProvider {
    dimensions: usize,
    model: String,
}

impl MockEmbeddingProvider {
    fn new(dimensions: usize) -> Self {
        Self { dimensions, model: "mock-embedding-001".to_string() }
    }

    fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> gita_rag::Result<Vec<f32>> {
        // Deterministic embedding: hash the text bytes, then generate a
        // normalised vector whose direction depends on the content.
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Counting mock generative model
// ---------------------------------------------------------------------------

struct CountingModel {
    calls: AtomicUsize,
}

impl CountingModel {
    fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeModel for CountingModel {
    async fn generate(&self, _prompt: &str) -> gita_rag::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("My dear friend, act without attachment to the fruits.".to_string())
    }
}

struct FailingModel;

#[async_trait]
impl GenerativeModel for FailingModel {
    async fn generate(&self, _prompt: &str) -> gita_rag::Result<String> {
        Err(GitaError::Dependency {
            service: "gemini".to_string(),
            message: "quota exceeded".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Store that refuses one insert batch
// ---------------------------------------------------------------------------

struct FlakyStore {
    inner: InMemoryVectorStore,
    fail_on_upsert: usize,
    upsert_calls: AtomicUsize,
}

impl FlakyStore {
    fn new(fail_on_upsert: usize) -> Self {
        Self {
            inner: InMemoryVectorStore::new(),
            fail_on_upsert,
            upsert_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VectorStore for FlakyStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> gita_rag::Result<()> {
        self.inner.create_collection(name, dimensions).await
    }

    async fn delete_collection(&self, name: &str) -> gita_rag::Result<()> {
        self.inner.delete_collection(name).await
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> gita_rag::Result<()> {
        let call = self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_on_upsert {
            return Err(GitaError::ServiceUnavailable {
                service: "memory".to_string(),
                message: "write refused".to_string(),
            });
        }
        self.inner.upsert(collection, chunks).await
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        filter: &SearchFilter,
        top_k: usize,
    ) -> gita_rag::Result<Vec<SearchResult>> {
        self.inner.search(collection, embedding, filter, top_k).await
    }

    async fn put_manifest(
        &self,
        collection: &str,
        manifest: &CollectionManifest,
    ) -> gita_rag::Result<()> {
        self.inner.put_manifest(collection, manifest).await
    }

    async fn get_manifest(
        &self,
        collection: &str,
    ) -> gita_rag::Result<Option<CollectionManifest>> {
        self.inner.get_manifest(collection).await
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const COLLECTION: &str = "gita_commentaries";

fn commentary(author: &str, shloka_id: &str, text: String) -> CommentaryRecord {
    CommentaryRecord {
        shloka_id: shloka_id.to_string(),
        chapter: 2,
        verse: 47,
        shloka_sanskrit: "कर्मण्येवाधिकारस्ते मा फलेषु कदाचन".to_string(),
        shloka_transliteration: None,
        author: author.to_string(),
        commentary_type: CommentaryType::EnglishCommentary,
        commentary_text: text,
    }
}

/// Ingest one 1500-character commentary and return the engine pieces.
async fn build_index(
    embedder: Arc<MockEmbeddingProvider>,
    store: Arc<InMemoryVectorStore>,
) -> gita_rag::IngestSummary {
    let config = Config::default();
    let chunker = RecursiveChunker::new(config.chunk_size, config.chunk_overlap);
    let record = commentary("Swami Sivananda", "BG2.47", "a".repeat(1500));
    let chunks = chunker.chunk_commentary(&record);

    let builder = IndexBuilder::new(embedder.clone(), store.clone(), config);
    let embeddings = builder.embed_chunks(&chunks).await.unwrap();
    builder.rebuild_collection(COLLECTION, &chunks, &embeddings).await.unwrap()
}

fn engine(
    embedder: Arc<MockEmbeddingProvider>,
    store: Arc<InMemoryVectorStore>,
    model: Arc<dyn GenerativeModel>,
) -> GitaEngine {
    GitaEngine::new(embedder, store, model, Config::default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn long_commentary_ingests_as_two_overlapping_chunks() {
    let config = Config::default();
    let chunker = RecursiveChunker::new(config.chunk_size, config.chunk_overlap);
    let record = commentary("Swami Sivananda", "BG2.47", "a".repeat(1500));
    let chunks = chunker.chunk_commentary(&record);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text.chars().count(), 1000);
    assert_eq!(chunks[1].text.chars().count(), 600);
    assert_eq!(&chunks[1].text[..100], &chunks[0].text[900..]);
    assert_eq!(chunks[0].metadata.chunk_index, 0);
    assert_eq!(chunks[1].metadata.chunk_index, 1);

    let embedder = Arc::new(MockEmbeddingProvider::new(16));
    let store = Arc::new(InMemoryVectorStore::new());
    let summary = build_index(embedder, store).await;
    assert_eq!(summary.chunks_total, 2);
    assert_eq!(summary.inserted, 2);
    assert!(summary.is_complete());
}

#[tokio::test]
async fn ask_returns_answer_with_sources_for_known_author() {
    let embedder = Arc::new(MockEmbeddingProvider::new(16));
    let store = Arc::new(InMemoryVectorStore::new());
    build_index(embedder.clone(), store.clone()).await;

    let model = Arc::new(CountingModel::new());
    let engine = engine(embedder, store, model.clone());

    let answer = engine
        .ask("What is selfless action?", "Swami Sivananda", OutputLanguage::English)
        .await
        .unwrap();

    assert_eq!(answer.answer, "My dear friend, act without attachment to the fruits.");
    assert_eq!(answer.sources.len(), 2);
    assert!(answer.sources.iter().all(|s| s.author == "Swami Sivananda"));
    assert!(answer.sources.iter().all(|s| s.shloka_id == "BG2.47"));
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn unknown_author_yields_apology_without_invoking_the_model() {
    let embedder = Arc::new(MockEmbeddingProvider::new(16));
    let store = Arc::new(InMemoryVectorStore::new());
    build_index(embedder.clone(), store.clone()).await;

    let model = Arc::new(CountingModel::new());
    let engine = engine(embedder, store, model.clone());

    let answer = engine
        .ask("What is selfless action?", "Sant Shri Dnyaneshwar", OutputLanguage::English)
        .await
        .unwrap();

    assert!(answer.sources.is_empty());
    assert_eq!(answer.answer, OutputLanguage::English.apology());
    assert_eq!(model.call_count(), 0);

    let hindi = engine
        .ask("निष्काम कर्म क्या है?", "Sant Shri Dnyaneshwar", OutputLanguage::Hindi)
        .await
        .unwrap();
    assert_eq!(hindi.answer, OutputLanguage::Hindi.apology());
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn blank_query_or_author_is_an_input_error() {
    let embedder = Arc::new(MockEmbeddingProvider::new(16));
    let store = Arc::new(InMemoryVectorStore::new());
    build_index(embedder.clone(), store.clone()).await;
    let engine = engine(embedder, store, Arc::new(CountingModel::new()));

    let err = engine.ask("  ", "Swami Sivananda", OutputLanguage::English).await.unwrap_err();
    assert!(matches!(err, GitaError::Input(_)));

    let err = engine.ask("question", "", OutputLanguage::English).await.unwrap_err();
    assert!(matches!(err, GitaError::Input(_)));
}

#[tokio::test]
async fn retriever_caps_results_at_k_in_score_order() {
    let embedder = Arc::new(MockEmbeddingProvider::new(16));
    let store = Arc::new(InMemoryVectorStore::new());

    // Ten distinct single-chunk commentaries for one author.
    let config = Config::default();
    let chunker = RecursiveChunker::new(config.chunk_size, config.chunk_overlap);
    let chunks: Vec<Chunk> = (0..10)
        .flat_map(|i| {
            chunker.chunk_commentary(&commentary(
                "Swami Sivananda",
                &format!("BG2.{i}"),
                format!("commentary number {i} on karma and duty"),
            ))
        })
        .collect();
    let builder = IndexBuilder::new(embedder.clone(), store.clone(), config);
    let embeddings = builder.embed_chunks(&chunks).await.unwrap();
    let summary = builder.rebuild_collection(COLLECTION, &chunks, &embeddings).await.unwrap();
    assert_eq!(summary.inserted, 10);

    let retriever = Retriever::new(embedder, store, COLLECTION);
    let results = retriever.retrieve("duty", "Swami Sivananda", 3).await.unwrap();
    assert_eq!(results.len(), 3);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let err = retriever.retrieve("duty", "Swami Sivananda", 0).await.unwrap_err();
    assert!(matches!(err, GitaError::Input(_)));
}

#[tokio::test]
async fn embedding_model_mismatch_fails_fast_at_query_time() {
    let build_embedder = Arc::new(MockEmbeddingProvider::new(16));
    let store = Arc::new(InMemoryVectorStore::new());
    build_index(build_embedder, store.clone()).await;

    let query_embedder = Arc::new(MockEmbeddingProvider::new(16).with_model("mock-embedding-002"));
    let retriever = Retriever::new(query_embedder, store, COLLECTION);

    let err = retriever.retrieve("duty", "Swami Sivananda", 3).await.unwrap_err();
    assert!(matches!(err, GitaError::Config(_)));
    assert!(err.to_string().contains("mock-embedding-001"));
}

#[tokio::test]
async fn generative_failure_surfaces_as_dependency_error() {
    let embedder = Arc::new(MockEmbeddingProvider::new(16));
    let store = Arc::new(InMemoryVectorStore::new());
    build_index(embedder.clone(), store.clone()).await;

    let engine = engine(embedder, store, Arc::new(FailingModel));
    let err = engine
        .ask("What is selfless action?", "Swami Sivananda", OutputLanguage::English)
        .await
        .unwrap_err();
    assert!(matches!(err, GitaError::Dependency { .. }));
}

#[tokio::test]
async fn synthesizer_preserves_source_order_exactly() {
    let results: Vec<SearchResult> = (0..3)
        .map(|i| SearchResult {
            chunk: Chunk {
                id: format!("c{i}"),
                text: format!("passage {i}"),
                embedding: Vec::new(),
                metadata: ChunkMetadata {
                    author: "Swami Sivananda".to_string(),
                    chapter: 2,
                    verse: 47 + i,
                    shloka_id: format!("BG2.{}", 47 + i),
                    commentary_type: CommentaryType::EnglishCommentary,
                    shloka_sanskrit: "श्लोक".to_string(),
                    chunk_index: 0,
                },
            },
            score: 1.0 - i as f32 * 0.1,
        })
        .collect();

    let model = Arc::new(CountingModel::new());
    let synthesizer = Synthesizer::new(model.clone());
    let answer =
        synthesizer.synthesize("question", &results, OutputLanguage::English).await.unwrap();

    assert_eq!(answer.sources.len(), 3);
    for (i, source) in answer.sources.iter().enumerate() {
        assert_eq!(source.shloka_id, format!("BG2.{}", 47 + i));
        assert_eq!(source.commentary, format!("passage {i}"));
    }
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn failed_insert_batch_is_audited_and_later_batches_continue() {
    let embedder = Arc::new(MockEmbeddingProvider::new(16));
    // Second upsert call (batch index 1) fails.
    let store = Arc::new(FlakyStore::new(1));
    let config = Config::builder().insert_batch_size(2).build().unwrap();
    let chunker = RecursiveChunker::new(config.chunk_size, config.chunk_overlap);

    // Five single-chunk commentaries, so batches are [2, 2, 1].
    let chunks: Vec<Chunk> = (0..5)
        .flat_map(|i| {
            chunker.chunk_commentary(&commentary(
                "Swami Sivananda",
                &format!("BG2.{i}"),
                format!("short commentary {i}"),
            ))
        })
        .collect();
    assert_eq!(chunks.len(), 5);

    let builder = IndexBuilder::new(embedder.clone(), store.clone(), config);
    let embeddings = builder.embed_chunks(&chunks).await.unwrap();
    let summary = builder.rebuild_collection(COLLECTION, &chunks, &embeddings).await.unwrap();

    assert_eq!(summary.chunks_total, 5);
    assert_eq!(summary.inserted, 3);
    assert!(!summary.is_complete());

    assert_eq!(summary.failed_batches.len(), 1);
    let failed = &summary.failed_batches[0];
    assert_eq!(failed.batch_index, 1);
    assert!(!failed.first_id.is_empty());
    assert!(!failed.last_id.is_empty());
    assert_ne!(failed.first_id, failed.last_id);
    assert!(failed.message.contains("write refused"));

    // Batches after the failure still landed and are queryable.
    let retriever = Retriever::new(embedder, store, COLLECTION);
    let results = retriever.retrieve("karma", "Swami Sivananda", 10).await.unwrap();
    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn rebuild_replaces_previous_collection_contents() {
    let embedder = Arc::new(MockEmbeddingProvider::new(16));
    let store = Arc::new(InMemoryVectorStore::new());

    build_index(embedder.clone(), store.clone()).await;
    // Rebuild with a different, single-chunk corpus.
    let config = Config::default();
    let chunks = RecursiveChunker::new(config.chunk_size, config.chunk_overlap)
        .chunk_commentary(&commentary("Swami Ramsukhdas", "BG2.48", "short text".to_string()));
    let builder = IndexBuilder::new(embedder.clone(), store.clone(), config);
    let embeddings = builder.embed_chunks(&chunks).await.unwrap();
    builder.rebuild_collection(COLLECTION, &chunks, &embeddings).await.unwrap();

    // The original author's chunks are gone.
    let retriever = Retriever::new(embedder, store, COLLECTION);
    let results = retriever.retrieve("duty", "Swami Sivananda", 5).await.unwrap();
    assert!(results.is_empty());

    let results = retriever.retrieve("duty", "Swami Ramsukhdas", 5).await.unwrap();
    assert_eq!(results.len(), 1);
}
