pub mod request_id;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controllers::{
    audio::AudioController, health, jobs::JobController, voices::VoiceController,
};
use crate::infrastructure::config::Config;
use crate::infrastructure::repositories::JobRepository;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

/// Everything the router needs to serve requests
pub struct HttpDependencies {
    pub job_repo: Arc<dyn JobRepository>,
    pub job_controller: Arc<JobController>,
    pub audio_controller: Arc<AudioController>,
    pub voice_controller: Arc<VoiceController>,
    pub max_upload_bytes: usize,
    pub permissive_cors: bool,
}

/// Build the application router with all routes and layers
pub fn build_router(deps: HttpDependencies) -> Router {
    // Job routes carry document uploads, so the body limit is raised here only
    let job_routes = Router::new()
        .route("/api/jobs", post(JobController::submit))
        .route("/api/jobs/:job_id", get(JobController::status))
        .with_state(deps.job_controller)
        .layer(DefaultBodyLimit::max(deps.max_upload_bytes));

    let audio_routes = Router::new()
        .route("/api/audio/:file_name", get(AudioController::download))
        .with_state(deps.audio_controller);

    let voice_routes = Router::new()
        .route("/api/voices", get(VoiceController::list_voices))
        .with_state(deps.voice_controller);

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(deps.job_repo)
        .merge(job_routes)
        .merge(audio_routes)
        .merge(voice_routes);

    let app = if deps.permissive_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    app.layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server on the configured address
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
