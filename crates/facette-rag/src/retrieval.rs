//! Retrieval orchestrator.
//!
//! For each intent: embed the query text, search under the compound
//! (feature AND variant) filter, and relax to feature-only when the
//! strict tier comes back empty. A too-strict match must degrade to a
//! broader one before being treated as "no data"; an intent with no hits
//! on either tier simply contributes no records.

use crate::embedding::{Embedder, EmbeddingError};
use crate::index::{IndexError, VectorIndex};
use facette_core::{RetrievalIntent, TechniqueRecord};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Retrieve technique records for the given intents, preserving intent
/// order. Collaborator transport failures propagate; empty result tiers
/// do not.
pub async fn retrieve(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    intents: &[RetrievalIntent],
    top_k: usize,
) -> Result<Vec<TechniqueRecord>, RetrievalError> {
    let mut records = Vec::new();

    for intent in intents {
        let vector = embedder.embed(&intent.query).await?;

        let mut hits = index
            .query(vector.clone(), &intent.feature, Some(&intent.variant), top_k)
            .await?;
        if hits.is_empty() {
            tracing::debug!(
                feature = %intent.feature,
                variant = %intent.variant,
                "strict filter empty, relaxing to feature-only"
            );
            hits = index.query(vector, &intent.feature, None, top_k).await?;
        }
        if hits.is_empty() {
            tracing::warn!(
                feature = %intent.feature,
                variant = %intent.variant,
                "no technique records on either filter tier"
            );
            continue;
        }

        for hit in hits {
            let steps: Vec<String> = match serde_json::from_str(&hit.steps_json) {
                Ok(steps) => steps,
                Err(err) => {
                    tracing::warn!(
                        feature = %hit.feature,
                        variant = %hit.variant,
                        error = %err,
                        "malformed steps payload, treating as empty"
                    );
                    Vec::new()
                }
            };
            records.push(TechniqueRecord {
                feature: hit.feature,
                variant: hit.variant,
                technique: hit.technique,
                steps,
                distance: hit.distance,
            });
        }
    }

    Ok(records)
}
