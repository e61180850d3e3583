use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use docvoice_backend::controllers::{
    audio::AudioController, jobs::JobController, voices::VoiceController,
};
use docvoice_backend::domain::job::{JobRunner, JobService, PipelineSettings};
use docvoice_backend::domain::speech::{AudioAssembler, ChunkExecutor, VoiceParams};
use docvoice_backend::infrastructure::config::{Config, LogFormat};
use docvoice_backend::infrastructure::db::{check_connection, create_pool, run_migrations};
use docvoice_backend::infrastructure::http::{build_router, start_http_server, HttpDependencies};
use docvoice_backend::infrastructure::repositories::{
    ArtifactRepository, DocumentTextExtractor, FsArtifactRepository, InMemoryJobRepository,
    JobRepository, PdfTextExtractor, PgJobRepository, PollyTtsRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting DocVoice Backend on {}:{}",
        config.host,
        config.port
    );

    // Job store: PostgreSQL when configured, process memory otherwise
    let job_repo: Arc<dyn JobRepository> = match &config.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url).await?;
            tracing::info!("Database connection pool created");

            check_connection(&pool).await?;
            tracing::info!("Database connection verified");

            run_migrations(&pool).await?;
            tracing::info!("Database migrations applied");

            Arc::new(PgJobRepository::new(Arc::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, job records will be kept in memory only");
            Arc::new(InMemoryJobRepository::new())
        }
    };

    // Create AWS Polly client
    tracing::info!("Initializing AWS Polly client with region: {}", config.aws_region);

    let has_access_key = std::env::var("AWS_ACCESS_KEY_ID").is_ok();
    let has_secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();
    if !has_access_key || !has_secret_key {
        tracing::warn!("AWS credentials not found in environment variables. Will attempt to use other credential providers (instance metadata, etc.)");
    }

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .retry_config(
            aws_config::retry::RetryConfig::adaptive()
                .with_max_attempts(config.polly_max_attempts),
        )
        .load()
        .await;

    tracing::info!(
        region = ?aws_config.region(),
        max_attempts = config.polly_max_attempts,
        "AWS configuration loaded"
    );

    let polly_client = Arc::new(aws_sdk_polly::Client::new(&aws_config));
    tracing::info!("AWS Polly client initialized successfully");

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories
    tracing::info!("Instantiating repositories...");
    let polly_repo = Arc::new(PollyTtsRepository::new(
        polly_client.clone(),
        config.polly_output_format,
    ));
    let artifact_repo: Arc<dyn ArtifactRepository> =
        Arc::new(FsArtifactRepository::new(config.audio_dir.clone()));
    let pdf_extractor = PdfTextExtractor::spawn(config.pdfium_library_path.clone())?;
    let text_extractor = Arc::new(DocumentTextExtractor::new(Box::new(pdf_extractor)));

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.audio_dir).await?;

    // 2. Instantiate the pipeline and services
    tracing::info!(
        max_chunk_chars = config.max_chunk_chars,
        concurrency_limit = config.concurrency_limit,
        assembly = ?config.audio_assembly,
        output_format = ?config.polly_output_format,
        dispatch = ?config.job_dispatch,
        job_timeout_secs = config.job_timeout.as_secs(),
        "Instantiating services..."
    );
    let runner = Arc::new(JobRunner::new(
        job_repo.clone(),
        text_extractor,
        ChunkExecutor::new(polly_repo.clone(), config.concurrency_limit),
        AudioAssembler::new(
            config.audio_assembly,
            config.polly_output_format,
            artifact_repo.clone(),
        ),
        artifact_repo.clone(),
        PipelineSettings {
            max_chunk_chars: config.max_chunk_chars,
            max_document_chars: config.max_document_chars,
        },
    ));
    let job_service = Arc::new(JobService::new(
        job_repo.clone(),
        runner,
        config.upload_dir.clone(),
        config.job_dispatch,
        VoiceParams::new(config.default_voice.clone(), config.default_engine.clone()),
        config.job_timeout,
    ));

    // 3. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let app = build_router(HttpDependencies {
        job_repo,
        job_controller: Arc::new(JobController::new(job_service)),
        audio_controller: Arc::new(AudioController::new(artifact_repo)),
        voice_controller: Arc::new(VoiceController::new(polly_repo)),
        max_upload_bytes: config.max_upload_bytes,
        permissive_cors: config.is_development(),
    });

    // Start HTTP server with all routes
    start_http_server(config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "docvoice_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "docvoice_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
