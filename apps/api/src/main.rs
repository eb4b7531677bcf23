mod batch;
mod config;
mod db;
mod documents;
mod errors;
mod evaluation;
mod extraction;
mod llm_client;
mod models;
mod pipeline;
mod ranking;
mod repository;
mod routes;
mod state;
mod storage;
#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StorageConfig};
use crate::db::create_pool;
use crate::documents::FileTextExtractor;
use crate::evaluation::job_skills::LlmJobSkillExtractor;
use crate::evaluation::notifications::{LogNotifier, Notifier};
use crate::evaluation::scorer::LlmCandidateScorer;
use crate::extraction::fields::LlmCvExtractor;
use crate::llm_client::LlmClient;
use crate::repository::memory::{
    InMemoryCandidateRepository, InMemoryEvaluationRepository, InMemoryJobRepository,
};
use crate::repository::postgres::{
    PgCandidateRepository, PgEvaluationRepository, PgJobRepository,
};
use crate::routes::build_router;
use crate::state::{AppState, Collaborators, Repositories};
use crate::storage::{LocalObjectStorage, ObjectStorage, S3ObjectStorage};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("cvflow_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CVFlow API v{}", env!("CARGO_PKG_VERSION"));

    // Persistence: PostgreSQL when configured, otherwise process memory
    let repositories = match &config.database_url {
        Some(url) => {
            let db = create_pool(url).await?;
            Repositories {
                candidates: Arc::new(PgCandidateRepository::new(db.clone())),
                jobs: Arc::new(PgJobRepository::new(db.clone())),
                evaluations: Arc::new(PgEvaluationRepository::new(db)),
            }
        }
        None => {
            info!("DATABASE_URL not set; using in-memory repositories");
            Repositories {
                candidates: Arc::new(InMemoryCandidateRepository::default()),
                jobs: Arc::new(InMemoryJobRepository::default()),
                evaluations: Arc::new(InMemoryEvaluationRepository::default()),
            }
        }
    };

    // Object storage for uploaded CVs
    let storage: Arc<dyn ObjectStorage> = match &config.storage {
        StorageConfig::S3 {
            bucket,
            endpoint,
            access_key_id,
            secret_access_key,
        } => {
            let s3 = build_s3_client(endpoint, access_key_id, secret_access_key).await;
            info!("S3 client initialized (bucket: {bucket})");
            Arc::new(S3ObjectStorage::new(s3, bucket.clone(), config.cv_url_expiry))
        }
        StorageConfig::Local { root } => {
            info!("Local CV storage at {}", root.display());
            Arc::new(LocalObjectStorage::new(root.clone()))
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let collaborators = Collaborators {
        storage,
        documents: Arc::new(FileTextExtractor),
        fields: Arc::new(LlmCvExtractor::new(llm.clone())),
        job_skills: Arc::new(LlmJobSkillExtractor::new(llm.clone())),
        scorer: Arc::new(LlmCandidateScorer::new(llm)),
        notifiers: vec![Arc::new(LogNotifier) as Arc<dyn Notifier>],
    };

    info!("Batch intake reads CVs from {}", config.cv_intake_dir.display());

    let port = config.port;
    let state = AppState::new(config, repositories, collaborators);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the HR dashboard has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(
    endpoint: &str,
    access_key_id: &str,
    secret_access_key: &str,
) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        access_key_id,
        secret_access_key,
        None,
        None,
        "cvflow-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
