//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`]
//! using the [qdrant-client](https://docs.rs/qdrant-client) crate over
//! gRPC. Chunk provenance is stored as flat payload fields so the
//! author filter maps directly onto a Qdrant keyword match. The
//! collection manifest lives in a companion `<name>__manifest`
//! collection holding a single well-known point.

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, GetPointsBuilder, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::debug;

use crate::corpus::CommentaryType;
use crate::document::{Chunk, ChunkMetadata, CollectionManifest, SearchResult};
use crate::error::{GitaError, Result};
use crate::vectorstore::{SearchFilter, VectorStore};

/// Point id reserved for the manifest inside companion collections.
const MANIFEST_POINT_ID: &str = "00000000-0000-0000-0000-000000000000";

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Collections use cosine distance; search scores are cosine
/// similarity, higher is better.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Create a new Qdrant vector store connecting to the given URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    /// Create a new Qdrant vector store with the default URL
    /// (`http://localhost:6334`).
    pub fn default_url() -> Result<Self> {
        Self::new("http://localhost:6334")
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn map_err(e: qdrant_client::QdrantError) -> GitaError {
        GitaError::ServiceUnavailable { service: "qdrant".to_string(), message: e.to_string() }
    }

    fn manifest_collection(name: &str) -> String {
        format!("{name}__manifest")
    }

    /// Extract a string from a Qdrant payload value.
    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Extract an integer from a Qdrant payload value.
    fn extract_integer(value: &QdrantValue) -> Option<i64> {
        match &value.kind {
            Some(Kind::IntegerValue(i)) => Some(*i),
            _ => None,
        }
    }

    fn chunk_payload(chunk: &Chunk) -> Result<Payload> {
        let value = serde_json::json!({
            "text": chunk.text,
            "author": chunk.metadata.author,
            "chapter": chunk.metadata.chapter,
            "verse": chunk.metadata.verse,
            "shloka_id": chunk.metadata.shloka_id,
            "commentary_type": chunk.metadata.commentary_type.as_str(),
            "shloka_sanskrit": chunk.metadata.shloka_sanskrit,
            "chunk_index": chunk.metadata.chunk_index,
        });
        Payload::try_from(value).map_err(Self::map_err)
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        if self.client.collection_exists(name).await.map_err(Self::map_err)? {
            debug!(collection = name, "qdrant collection already exists, skipping creation");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        for collection in [name.to_string(), Self::manifest_collection(name)] {
            if self.client.collection_exists(&collection).await.map_err(Self::map_err)? {
                self.client.delete_collection(&collection).await.map_err(Self::map_err)?;
                debug!(collection = %collection, "deleted qdrant collection");
            }
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = chunks
            .iter()
            .map(|chunk| {
                Ok(PointStruct::new(
                    chunk.id.clone(),
                    chunk.embedding.clone(),
                    Self::chunk_payload(chunk)?,
                ))
            })
            .collect::<Result<_>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = chunks.len(), "upserted chunks to qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        filter: &SearchFilter,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let mut builder = SearchPointsBuilder::new(collection, embedding.to_vec(), top_k as u64)
            .with_payload(true);

        if let Some(author) = &filter.author {
            builder = builder.filter(Filter::must([Condition::matches("author", author.clone())]));
        }

        let response = self.client.search_points(builder).await.map_err(Self::map_err)?;

        // Results keep the order Qdrant returned them in; no re-sort.
        let results = response
            .result
            .into_iter()
            .map(|scored| {
                let id = scored
                    .id
                    .as_ref()
                    .and_then(|pid| match &pid.point_id_options {
                        Some(PointIdOptions::Uuid(s)) => Some(s.clone()),
                        Some(PointIdOptions::Num(n)) => Some(n.to_string()),
                        None => None,
                    })
                    .unwrap_or_default();

                let get_string = |key: &str| {
                    scored.payload.get(key).and_then(Self::extract_string).unwrap_or_default()
                };
                let get_integer = |key: &str| {
                    scored.payload.get(key).and_then(Self::extract_integer).unwrap_or_default()
                };

                let metadata = ChunkMetadata {
                    author: get_string("author"),
                    chapter: get_integer("chapter") as u32,
                    verse: get_integer("verse") as u32,
                    shloka_id: get_string("shloka_id"),
                    commentary_type: CommentaryType::from_name(&get_string("commentary_type"))
                        .unwrap_or(CommentaryType::EnglishCommentary),
                    shloka_sanskrit: get_string("shloka_sanskrit"),
                    chunk_index: get_integer("chunk_index") as usize,
                };

                SearchResult {
                    chunk: Chunk { id, text: get_string("text"), embedding: vec![], metadata },
                    score: scored.score,
                }
            })
            .collect();

        Ok(results)
    }

    async fn put_manifest(&self, collection: &str, manifest: &CollectionManifest) -> Result<()> {
        let name = Self::manifest_collection(collection);

        if self.client.collection_exists(&name).await.map_err(Self::map_err)? {
            self.client.delete_collection(&name).await.map_err(Self::map_err)?;
        }
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&name)
                    .vectors_config(VectorParamsBuilder::new(1, Distance::Dot)),
            )
            .await
            .map_err(Self::map_err)?;

        let payload = serde_json::json!({
            "embedding_model": manifest.embedding_model,
            "dimensions": manifest.dimensions,
            "chunk_count": manifest.chunk_count,
            "built_at": manifest.built_at.to_rfc3339(),
        });
        let point = PointStruct::new(
            MANIFEST_POINT_ID,
            vec![1.0],
            Payload::try_from(payload).map_err(Self::map_err)?,
        );

        self.client
            .upsert_points(UpsertPointsBuilder::new(&name, vec![point]).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, model = %manifest.embedding_model, "recorded collection manifest");
        Ok(())
    }

    async fn get_manifest(&self, collection: &str) -> Result<Option<CollectionManifest>> {
        let name = Self::manifest_collection(collection);

        if !self.client.collection_exists(&name).await.map_err(Self::map_err)? {
            return Ok(None);
        }

        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(&name, vec![MANIFEST_POINT_ID.into()]).with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let Some(point) = response.result.into_iter().next() else {
            return Ok(None);
        };

        let embedding_model =
            point.payload.get("embedding_model").and_then(Self::extract_string);
        let dimensions = point.payload.get("dimensions").and_then(Self::extract_integer);
        let chunk_count = point.payload.get("chunk_count").and_then(Self::extract_integer);
        let built_at = point
            .payload
            .get("built_at")
            .and_then(Self::extract_string)
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| t.with_timezone(&chrono::Utc));

        match (embedding_model, dimensions, chunk_count, built_at) {
            (Some(embedding_model), Some(dimensions), Some(chunk_count), Some(built_at)) => {
                Ok(Some(CollectionManifest {
                    embedding_model,
                    dimensions: dimensions as usize,
                    chunk_count: chunk_count as usize,
                    built_at,
                }))
            }
            _ => Ok(None),
        }
    }
}
