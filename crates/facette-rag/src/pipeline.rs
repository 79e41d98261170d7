//! End-to-end recommendation pipeline.
//!
//! Owns the three collaborators as explicitly passed-in dependencies and
//! drives one analysis: profile → intents → retrieval → generation →
//! ordered recommendation list. Stages run sequentially per request;
//! the only shared state is the read-only index.

use crate::embedding::Embedder;
use crate::generation::{generate, TextGenerator};
use crate::index::VectorIndex;
use crate::retrieval::{retrieve, RetrievalError};
use facette_core::{build_intents, FeatureProfile, Recommendation};

pub struct PipelineOptions {
    pub top_k: usize,
    pub max_generation_attempts: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: 1,
            max_generation_attempts: crate::generation::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

pub struct Pipeline {
    embedder: Box<dyn Embedder>,
    index: Box<dyn VectorIndex>,
    generator: Box<dyn TextGenerator>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        embedder: Box<dyn Embedder>,
        index: Box<dyn VectorIndex>,
        generator: Box<dyn TextGenerator>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            options,
        }
    }

    /// Run one analysis over a classified profile.
    ///
    /// Retrieval transport failures fail the request atomically;
    /// generation unreliability never does.
    pub async fn run(
        &self,
        profile: &FeatureProfile,
    ) -> Result<Vec<Recommendation>, RetrievalError> {
        let intents = build_intents(profile);
        tracing::info!(count = intents.len(), "derived retrieval intents");

        let records = retrieve(
            self.embedder.as_ref(),
            self.index.as_ref(),
            &intents,
            self.options.top_k,
        )
        .await?;
        tracing::info!(count = records.len(), "retrieved technique records");

        let mut recommendations = Vec::with_capacity(records.len());
        for record in records {
            let (why_it_matches, awareness) = generate(
                self.generator.as_ref(),
                &record,
                self.options.max_generation_attempts,
            )
            .await;
            recommendations.push(Recommendation {
                feature: record.feature,
                variant: record.variant,
                technique: record.technique,
                steps: record.steps,
                why_it_matches,
                awareness,
            });
        }

        tracing::info!(count = recommendations.len(), "assembled recommendations");
        Ok(recommendations)
    }
}
