use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use facette_core::{
    classify, compute_metrics, FeatureProfile, Landmark, LandmarkError, LandmarkProvider,
    LandmarkSet, Recommendation,
};
use facette_rag::{
    load_knowledge, rebuild_index, EmbeddingConfig, GeneratorConfig, HttpEmbedder,
    OllamaGenerator, Pipeline, PipelineOptions, QdrantIndex,
};

mod config;
use config::Config;

/// Side length of the normalized image space the landmarks come from.
const NORMALIZED_IMAGE_SIZE: u32 = 512;

#[derive(Parser)]
#[command(name = "facette", about = "Facette facial-feature analysis CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: landmarks → profile → retrieval → recommendations
    Analyze {
        /// Pre-extracted landmark JSON file
        #[arg(short, long)]
        landmarks: PathBuf,
        /// Where to write the analysis report (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Classification only: profile and narrative, no collaborators needed
    Profile {
        /// Pre-extracted landmark JSON file
        #[arg(short, long)]
        landmarks: PathBuf,
        /// Where to write the profile (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rebuild the knowledge collection from the knowledge directory
    Index {
        /// Knowledge directory (FACETTE_KNOWLEDGE_DIR if omitted)
        #[arg(short, long)]
        knowledge: Option<PathBuf>,
    },
}

/// Landmark provider reading pre-extracted landmark JSON
/// (`{"landmarks": [[x, y, z], …]}`). Image decoding and mesh inference
/// stay with the external detection service.
struct FileLandmarkProvider;

#[derive(serde::Deserialize)]
struct LandmarkFile {
    landmarks: Vec<[f64; 3]>,
}

impl LandmarkProvider for FileLandmarkProvider {
    fn detect(&self, image: &[u8]) -> Result<LandmarkSet, LandmarkError> {
        let file: LandmarkFile = serde_json::from_slice(image)
            .map_err(|err| LandmarkError::InvalidImage(err.to_string()))?;
        if file.landmarks.is_empty() {
            return Err(LandmarkError::NoFaceDetected);
        }
        Ok(LandmarkSet::new(
            file.landmarks
                .into_iter()
                .map(|[x, y, z]| Landmark::new(x, y, z))
                .collect(),
        ))
    }
}

/// Complete analysis artifact written at the output boundary.
#[derive(serde::Serialize)]
struct AnalysisReport {
    profile: FeatureProfile,
    narrative: String,
    recommendations: Vec<Recommendation>,
    generated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(serde::Serialize)]
struct ProfileReport {
    profile: FeatureProfile,
    narrative: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Analyze { landmarks, output } => analyze(&config, &landmarks, output).await,
        Commands::Profile { landmarks, output } => profile_only(&landmarks, output),
        Commands::Index { knowledge } => {
            let dir = knowledge.unwrap_or_else(|| config.knowledge_dir.clone());
            index_knowledge(&config, &dir).await
        }
    }
}

fn classify_from_file(path: &Path) -> Result<(FeatureProfile, String)> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading landmark file {}", path.display()))?;
    let landmarks = FileLandmarkProvider.detect(&bytes)?;
    tracing::info!(count = landmarks.len(), "loaded landmarks");

    let metrics = compute_metrics(&landmarks, (NORMALIZED_IMAGE_SIZE, NORMALIZED_IMAGE_SIZE))?;
    let (profile, narrative) = classify(&metrics)?;
    Ok((profile, narrative))
}

async fn analyze(config: &Config, landmarks: &Path, output: Option<PathBuf>) -> Result<()> {
    let (profile, narrative) = classify_from_file(landmarks)?;
    println!("{narrative}\n");

    let embedder = HttpEmbedder::new(EmbeddingConfig {
        url: config.embedding_url.clone(),
        model: config.embedding_model.clone(),
        dimensions: config.embedding_dim,
        timeout_secs: config.embedding_timeout_secs,
    })?;
    let index = QdrantIndex::open(&config.qdrant_url, &config.collection, config.embedding_dim)?;

    // The index is rebuilt once per run, before any retrieval reads.
    let entries = load_knowledge(&config.knowledge_dir)?;
    let indexed = rebuild_index(&index, &embedder, &entries).await?;
    tracing::info!(indexed, "knowledge index ready");

    let generator = OllamaGenerator::new(GeneratorConfig {
        url: config.llm_url.clone(),
        model: config.llm_model.clone(),
        timeout_secs: config.llm_timeout_secs,
    })?;

    let pipeline = Pipeline::new(
        Box::new(embedder),
        Box::new(index),
        Box::new(generator),
        PipelineOptions {
            top_k: config.top_k,
            max_generation_attempts: config.generation_retries,
        },
    );

    let recommendations = pipeline.run(&profile).await?;

    let report = AnalysisReport {
        profile,
        narrative,
        recommendations,
        generated_at: chrono::Utc::now(),
    };
    write_json(&report, output.as_deref())
}

fn profile_only(landmarks: &Path, output: Option<PathBuf>) -> Result<()> {
    let (profile, narrative) = classify_from_file(landmarks)?;
    println!("{narrative}\n");
    write_json(&ProfileReport { profile, narrative }, output.as_deref())
}

async fn index_knowledge(config: &Config, dir: &Path) -> Result<()> {
    let embedder = HttpEmbedder::new(EmbeddingConfig {
        url: config.embedding_url.clone(),
        model: config.embedding_model.clone(),
        dimensions: config.embedding_dim,
        timeout_secs: config.embedding_timeout_secs,
    })?;
    let index = QdrantIndex::open(&config.qdrant_url, &config.collection, config.embedding_dim)?;

    let entries = load_knowledge(dir)?;
    let indexed = rebuild_index(&index, &embedder, &entries).await?;
    println!("Indexed {indexed} technique entries into {}", config.collection);
    Ok(())
}

fn write_json<T: serde::Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("writing output to {}", path.display()))?;
            println!("Report saved to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
