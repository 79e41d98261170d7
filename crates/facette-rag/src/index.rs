//! Vector-index client and knowledge indexing.
//!
//! The index is an external collaborator reached through the
//! [`VectorIndex`] seam so orchestration code can run against test
//! doubles. The production implementation is qdrant-backed. Rebuilding
//! is an exclusive maintenance operation: run once at session start,
//! never concurrently with retrieval reads.

use crate::embedding::{Embedder, EmbeddingError};
use crate::knowledge::KnowledgeEntry;
use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config;
use qdrant_client::qdrant::{
    Condition, CreateCollection, Distance, Filter, PointStruct, SearchPoints, UpsertPoints,
    VectorParams, VectorsConfig,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("vector index error: {0}")]
    Qdrant(#[from] qdrant_client::QdrantError),
    #[error("embedding failed during rebuild: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// A document staged for upsert: vector plus technique payload.
#[derive(Debug, Clone)]
pub struct IndexDocument {
    /// Stable identity seed, `{feature}_{variant}_{ordinal}`.
    pub id_seed: String,
    pub vector: Vec<f32>,
    pub feature: String,
    pub variant: String,
    pub technique: String,
    /// Step list serialized as JSON text; deserialized again at retrieval.
    pub steps_json: String,
}

/// One nearest-neighbour hit mapped out of the index payload.
#[derive(Debug, Clone)]
pub struct IndexHit {
    pub feature: String,
    pub variant: String,
    pub technique: String,
    pub steps_json: String,
    pub distance: f32,
}

/// Query contract of the vector-index collaborator.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Drop the collection if present and create it empty.
    async fn recreate(&self) -> Result<(), IndexError>;
    async fn upsert(&self, documents: Vec<IndexDocument>) -> Result<(), IndexError>;
    /// Nearest neighbours under a feature filter, optionally narrowed to a
    /// variant.
    async fn query(
        &self,
        vector: Vec<f32>,
        feature: &str,
        variant: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<IndexHit>, IndexError>;
}

/// Deterministic point id for an identity seed, stable across rebuilds.
pub fn point_id_for_seed(seed: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string()
}

/// Qdrant-backed index with its own client lifecycle.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    dimensions: usize,
}

impl QdrantIndex {
    pub fn open(url: &str, collection: &str, dimensions: usize) -> Result<Self, IndexError> {
        let client = Qdrant::from_url(url).build()?;
        Ok(Self {
            client,
            collection: collection.to_string(),
            dimensions,
        })
    }

    async fn collection_exists(&self) -> Result<bool, IndexError> {
        let collections = self.client.list_collections().await?;
        Ok(collections
            .collections
            .iter()
            .any(|c| c.name == self.collection))
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        filter: Filter,
        top_k: usize,
    ) -> Result<Vec<IndexHit>, IndexError> {
        let response = self
            .client
            .search_points(SearchPoints {
                collection_name: self.collection.clone(),
                vector,
                limit: top_k as u64,
                filter: Some(filter),
                with_payload: Some(true.into()),
                ..Default::default()
            })
            .await?;

        Ok(response
            .result
            .into_iter()
            .map(|point| IndexHit {
                feature: payload_str(&point.payload, "feature"),
                variant: payload_str(&point.payload, "variant"),
                technique: payload_str(&point.payload, "technique"),
                steps_json: payload_str(&point.payload, "steps"),
                distance: point.score,
            })
            .collect())
    }
}

fn payload_str(payload: &HashMap<String, qdrant_client::qdrant::Value>, key: &str) -> String {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => s.clone(),
        _ => String::new(),
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn recreate(&self) -> Result<(), IndexError> {
        if self.collection_exists().await? {
            self.client.delete_collection(self.collection.clone()).await?;
        }
        self.client
            .create_collection(CreateCollection {
                collection_name: self.collection.clone(),
                vectors_config: Some(VectorsConfig {
                    config: Some(Config::Params(VectorParams {
                        size: self.dimensions as u64,
                        distance: Distance::Cosine.into(),
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await?;
        tracing::info!(collection = %self.collection, dims = self.dimensions, "recreated index collection");
        Ok(())
    }

    async fn upsert(&self, documents: Vec<IndexDocument>) -> Result<(), IndexError> {
        if documents.is_empty() {
            return Ok(());
        }
        let points: Vec<PointStruct> = documents
            .into_iter()
            .map(|doc| {
                let mut payload = Payload::new();
                payload.insert("id", doc.id_seed.clone());
                payload.insert("feature", doc.feature);
                payload.insert("variant", doc.variant);
                payload.insert("technique", doc.technique);
                payload.insert("steps", doc.steps_json);
                PointStruct::new(point_id_for_seed(&doc.id_seed), doc.vector, payload)
            })
            .collect();

        let count = points.len();
        self.client
            .upsert_points(UpsertPoints {
                collection_name: self.collection.clone(),
                points,
                ..Default::default()
            })
            .await?;
        tracing::debug!(count, collection = %self.collection, "upserted index points");
        Ok(())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        feature: &str,
        variant: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<IndexHit>, IndexError> {
        let mut conditions = vec![Condition::matches("feature", feature.to_string())];
        if let Some(variant) = variant {
            conditions.push(Condition::matches("variant", variant.to_string()));
        }
        self.search(vector, Filter::must(conditions), top_k).await
    }
}

/// Rebuild the knowledge collection from loaded entries: recreate, embed
/// each entry's joined step text, upsert one point per entry.
pub async fn rebuild_index(
    index: &dyn VectorIndex,
    embedder: &dyn Embedder,
    entries: &[KnowledgeEntry],
) -> Result<usize, IndexError> {
    index.recreate().await?;

    let mut documents = Vec::with_capacity(entries.len());
    for (ordinal, entry) in entries.iter().enumerate() {
        let vector = embedder.embed(&entry.steps.join(" ")).await?;
        let steps_json =
            serde_json::to_string(&entry.steps).unwrap_or_else(|_| "[]".to_string());
        documents.push(IndexDocument {
            id_seed: format!("{}_{}_{}", entry.feature, entry.variant, ordinal),
            vector,
            feature: entry.feature.clone(),
            variant: entry.variant.clone(),
            technique: entry.technique.clone(),
            steps_json,
        });
    }

    let count = documents.len();
    index.upsert(documents).await?;
    tracing::info!(count, "rebuilt knowledge index");
    Ok(count)
}
