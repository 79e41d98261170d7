//! facette-rag — Retrieval-augmented recommendation synthesis.
//!
//! Collaborator clients (embedding service, vector index, text
//! generator), the knowledge-base indexer, and the orchestration that
//! turns a classified feature profile into grounded recommendations.

pub mod embedding;
pub mod generation;
pub mod index;
pub mod knowledge;
pub mod pipeline;
pub mod repair;
pub mod retrieval;

pub use embedding::{Embedder, EmbeddingConfig, EmbeddingError, HttpEmbedder};
pub use generation::{GenerationError, GeneratorConfig, OllamaGenerator, TextGenerator};
pub use index::{rebuild_index, IndexError, QdrantIndex, VectorIndex};
pub use knowledge::{load_knowledge, KnowledgeEntry, KnowledgeError};
pub use pipeline::{Pipeline, PipelineOptions};
pub use retrieval::{retrieve, RetrievalError};
