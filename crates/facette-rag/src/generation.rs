//! Generation orchestrator.
//!
//! Builds the constrained prompt, drives the text generator with a
//! bounded retry budget, and guarantees non-empty explanation and
//! caution text through deterministic fallbacks. Steps are ground truth
//! and pass through untouched; the generator is only ever asked to add
//! an explanation and a caution.

use crate::repair::{extract_fields, parse_lenient, ExtractedFields};
use async_trait::async_trait;
use facette_core::TechniqueRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
const CONNECT_TIMEOUT_SECS: u64 = 5;
const ERROR_BODY_PREVIEW: usize = 256;

const NO_STEPS_PLACEHOLDER: &str = "No steps available";
const FALLBACK_AWARENESS: &str =
    "Apply products gently and blend well to maintain a natural look.";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation service returned {status}: {body}")]
    Service { status: u16, body: String },
}

/// Prompt → free text contract of the generation collaborator. The
/// output carries no structural guarantee and may fail or time out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub url: String,
    pub model: String,
    /// Per-attempt bound; a timed-out attempt consumes one retry.
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "phi3".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama-style completion client.
pub struct OllamaGenerator {
    config: GeneratorConfig,
    client: Client,
}

impl OllamaGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Service {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.response)
    }
}

/// Constrained prompt: states the technique and its verbatim steps, and
/// restricts the generator to adding an explanation and a caution.
pub fn build_prompt(record: &TechniqueRecord) -> String {
    let technique = if record.technique.is_empty() {
        "No specific technique provided"
    } else {
        &record.technique
    };
    let steps_text =
        serde_json::to_string_pretty(&record.steps).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are a professional makeup educator.\n\
         \n\
         STRICT RULES:\n\
         - You MUST NOT create, modify, reorder, or rephrase steps\n\
         - Steps are PROVIDED and MUST remain EXACTLY the same\n\
         - You are ONLY allowed to:\n\
         \x20 1. Explain why this technique suits the feature\n\
         \x20 2. Add awareness or caution notes\n\
         \n\
         Feature: {}\n\
         Variant: {}\n\
         Technique: {}\n\
         \n\
         Provided steps (DO NOT CHANGE):\n\
         {}\n\
         \n\
         Return ONLY valid JSON in this EXACT structure:\n\
         {{\n\
         \x20 \"why_it_matches\": \"clear, concise explanation\",\n\
         \x20 \"awareness\": \"simple precaution or tip\"\n\
         }}",
        record.feature, record.variant, technique, steps_text
    )
}

fn fallback_why(record: &TechniqueRecord) -> String {
    format!(
        "This technique ({}) suits the {} {} by enhancing natural features and maintaining balance.",
        record.technique, record.variant, record.feature
    )
}

/// Generate explanation and caution text for one technique record.
///
/// Always returns usable strings: records without steps short-circuit,
/// and exhausted retries fall back to deterministic sentences. Generator
/// unreliability is logged, never propagated.
pub async fn generate(
    generator: &dyn TextGenerator,
    record: &TechniqueRecord,
    max_attempts: usize,
) -> (String, String) {
    if record.steps.is_empty() {
        return (NO_STEPS_PLACEHOLDER.to_string(), String::new());
    }

    let prompt = build_prompt(record);
    let mut fields = ExtractedFields::default();

    for attempt in 1..=max_attempts {
        match generator.complete(&prompt).await {
            Ok(raw) => match parse_lenient(&raw) {
                Some(parsed) => {
                    let extracted = extract_fields(&parsed);
                    if !extracted.is_empty() {
                        fields = extracted;
                        break;
                    }
                    tracing::warn!(
                        attempt,
                        feature = %record.feature,
                        "generator answered without usable fields"
                    );
                }
                None => {
                    tracing::warn!(
                        attempt,
                        feature = %record.feature,
                        raw = %raw,
                        "generator output failed to parse"
                    );
                }
            },
            Err(err) => {
                tracing::warn!(
                    attempt,
                    feature = %record.feature,
                    error = %err,
                    "generation attempt failed"
                );
            }
        }
    }

    let why = if fields.why_it_matches.is_empty() {
        fallback_why(record)
    } else {
        fields.why_it_matches
    };
    let awareness = if fields.awareness.is_empty() {
        FALLBACK_AWARENESS.to_string()
    } else {
        fields.awareness
    };
    (why, awareness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record() -> TechniqueRecord {
        TechniqueRecord {
            feature: "lips".to_string(),
            variant: "full".to_string(),
            technique: "overlining".to_string(),
            steps: vec!["line outer edge".to_string(), "blend center".to_string()],
            distance: 0.1,
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl TextGenerator for AlwaysFails {
        async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Service {
                status: 500,
                body: "down".to_string(),
            })
        }
    }

    struct AlwaysMalformed;

    #[async_trait]
    impl TextGenerator for AlwaysMalformed {
        async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
            Ok("Sorry, I can only answer in prose.".to_string())
        }
    }

    struct Scripted {
        calls: AtomicUsize,
        responses: Vec<&'static str>,
    }

    impl Scripted {
        fn new(responses: Vec<&'static str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses,
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.responses[i.min(self.responses.len() - 1)].to_string())
        }
    }

    #[test]
    fn test_prompt_states_record_and_verbatim_steps() {
        let prompt = build_prompt(&record());
        assert!(prompt.contains("Feature: lips"));
        assert!(prompt.contains("Variant: full"));
        assert!(prompt.contains("Technique: overlining"));
        assert!(prompt.contains("line outer edge"));
        assert!(prompt.contains("DO NOT CHANGE"));
        assert!(prompt.contains("\"why_it_matches\""));
        assert!(prompt.contains("\"awareness\""));
    }

    #[test]
    fn test_prompt_placeholder_for_missing_technique() {
        let mut r = record();
        r.technique = String::new();
        assert!(build_prompt(&r).contains("No specific technique provided"));
    }

    #[tokio::test]
    async fn test_failing_generator_falls_back() {
        let (why, awareness) = generate(&AlwaysFails, &record(), DEFAULT_MAX_ATTEMPTS).await;
        assert!(why.contains("overlining"));
        assert!(why.contains("full"));
        assert!(why.contains("lips"));
        assert_eq!(awareness, FALLBACK_AWARENESS);
    }

    #[tokio::test]
    async fn test_malformed_generator_falls_back() {
        let (why, awareness) = generate(&AlwaysMalformed, &record(), DEFAULT_MAX_ATTEMPTS).await;
        assert!(!why.is_empty());
        assert_eq!(awareness, FALLBACK_AWARENESS);
    }

    #[tokio::test]
    async fn test_empty_steps_short_circuit() {
        let mut r = record();
        r.steps.clear();
        let generator = Scripted::new(vec![r#"{"why_it_matches": "never called"}"#]);
        let (why, awareness) = generate(&generator, &r, DEFAULT_MAX_ATTEMPTS).await;
        assert_eq!(why, "No steps available");
        assert_eq!(awareness, "");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retry_until_usable_fields() {
        let generator = Scripted::new(vec![
            "no json here",
            r#"{"why_it_matches": "", "awareness": ""}"#,
            r#"{"why_it_matches": "suits the shape", "awareness": "blend softly"}"#,
        ]);
        let (why, awareness) = generate(&generator, &record(), DEFAULT_MAX_ATTEMPTS).await;
        assert_eq!(why, "suits the shape");
        assert_eq!(awareness, "blend softly");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_partial_fields_accepted_and_completed() {
        // One usable field is enough to accept the attempt; the other is
        // synthesized deterministically.
        let generator = Scripted::new(vec![r#"{"why_it_matches": "flatters the contour"}"#]);
        let (why, awareness) = generate(&generator, &record(), DEFAULT_MAX_ATTEMPTS).await;
        assert_eq!(why, "flatters the contour");
        assert_eq!(awareness, FALLBACK_AWARENESS);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fenced_output_repaired() {
        let generator = Scripted::new(vec![
            "```json {why_it_matches: 'great fit', awareness: 'blend well'} ```",
        ]);
        let (why, awareness) = generate(&generator, &record(), DEFAULT_MAX_ATTEMPTS).await;
        assert_eq!(why, "great fit");
        assert_eq!(awareness, "blend well");
    }

    #[tokio::test]
    async fn test_ollama_generator_http_roundtrip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"response": "{\"why_it_matches\": \"works\", \"awareness\": \"ok\"}"}"#)
            .create_async()
            .await;

        let generator = OllamaGenerator::new(GeneratorConfig {
            url: server.url(),
            ..GeneratorConfig::default()
        })
        .unwrap();

        let raw = generator.complete("prompt").await.unwrap();
        assert!(raw.contains("why_it_matches"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ollama_generator_service_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(500)
            .with_body("model not loaded")
            .create_async()
            .await;

        let generator = OllamaGenerator::new(GeneratorConfig {
            url: server.url(),
            ..GeneratorConfig::default()
        })
        .unwrap();

        let err = generator.complete("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::Service { status: 500, .. }));
    }
}
