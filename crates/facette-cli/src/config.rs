use std::path::PathBuf;

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// Base URL of the embedding service.
    pub embedding_url: String,
    /// Embedding model name sent with each request.
    pub embedding_model: String,
    /// Expected embedding vector length.
    pub embedding_dim: usize,
    /// Request timeout for embedding calls, in seconds.
    pub embedding_timeout_secs: u64,
    /// Qdrant endpoint URL.
    pub qdrant_url: String,
    /// Name of the technique collection.
    pub collection: String,
    /// Base URL of the text-generation service.
    pub llm_url: String,
    /// Generation model name.
    pub llm_model: String,
    /// Per-attempt timeout for generation calls, in seconds.
    pub llm_timeout_secs: u64,
    /// Nearest neighbours requested per retrieval intent.
    pub top_k: usize,
    /// Generation attempts before falling back to deterministic text.
    pub generation_retries: usize,
    /// Directory of knowledge JSON files.
    pub knowledge_dir: PathBuf,
}

impl Config {
    /// Load configuration from `FACETTE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            embedding_url: env_string("FACETTE_EMBEDDING_URL", "http://localhost:8082"),
            embedding_model: env_string("FACETTE_EMBEDDING_MODEL", "all-MiniLM-L6-v2"),
            embedding_dim: env_usize("FACETTE_EMBEDDING_DIM", 384),
            embedding_timeout_secs: env_u64("FACETTE_EMBEDDING_TIMEOUT_SECS", 10),
            qdrant_url: env_string("FACETTE_QDRANT_URL", "http://localhost:6334"),
            collection: env_string("FACETTE_COLLECTION", "facette_techniques"),
            llm_url: env_string("FACETTE_LLM_URL", "http://localhost:11434"),
            llm_model: env_string("FACETTE_LLM_MODEL", "phi3"),
            llm_timeout_secs: env_u64("FACETTE_LLM_TIMEOUT_SECS", 30),
            top_k: env_usize("FACETTE_TOP_K", 1),
            generation_retries: env_usize("FACETTE_GEN_RETRIES", 3),
            knowledge_dir: std::env::var("FACETTE_KNOWLEDGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./knowledge")),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
