use axum::Router;
use docvoice_backend::{
    controllers::{audio::AudioController, jobs::JobController, voices::VoiceController},
    domain::{
        job::{DispatchMode, JobRunner, JobService, PipelineSettings},
        speech::{AssemblyStrategy, AudioAssembler, ChunkExecutor, SegmentFormat, VoiceParams},
    },
    infrastructure::{
        http::{build_router, HttpDependencies},
        repositories::{
            ArtifactRepository, DocumentTextExtractor, FsArtifactRepository,
            InMemoryJobRepository, JobRepository,
        },
    },
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;

pub mod api_client;
pub mod fakes;

use api_client::{FormPart, TestClient};
use fakes::{FakePdfExtractor, FakeSynthesizer, FakeVoiceCatalog};

/// Chunk bound small enough that short test documents span several chunks
pub const TEST_MAX_CHUNK_CHARS: usize = 20;
pub const TEST_MAX_UPLOAD_BYTES: usize = 64 * 1024;
/// Jobs slower than this are failed by the host
pub const TEST_JOB_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TestContext {
    pub client: TestClient,
    pub tts: Arc<FakeSynthesizer>,
    pub upload_dir: PathBuf,
    pub audio_dir: PathBuf,
    _dir: TempDir,
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let upload_dir = dir.path().join("uploads");
            let audio_dir = dir.path().join("audio");
            let tts = Arc::new(FakeSynthesizer::default());

            let app = create_app_with_fakes(tts.clone(), upload_dir.clone(), audio_dir.clone());

            // Start server
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            Self {
                client: TestClient::new(&base_url),
                tts,
                upload_dir,
                audio_dir,
                _dir: dir,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Temp directories are removed when `_dir` drops
        }
    }
}

impl TestContext {
    /// Upload a document with optional voice/engine fields, returning the raw response
    pub async fn submit(
        &self,
        file_name: &str,
        content: &[u8],
        voice: Option<&str>,
        engine: Option<&str>,
    ) -> api_client::ApiResponse {
        let mut parts = vec![FormPart::File {
            name: "file",
            file_name,
            content,
        }];
        if let Some(voice) = voice {
            parts.push(FormPart::Text {
                name: "voice",
                value: voice,
            });
        }
        if let Some(engine) = engine {
            parts.push(FormPart::Text {
                name: "engine",
                value: engine,
            });
        }

        self.client
            .post_multipart("/api/jobs", &parts)
            .await
            .expect("Failed to submit document")
    }

    /// Submit a document that must be accepted and return its job id
    pub async fn submit_ok(&self, file_name: &str, content: &[u8]) -> String {
        let response = self.submit(file_name, content, None, None).await;
        response.assert_status(hyper::StatusCode::ACCEPTED);
        response
            .body
            .as_ref()
            .and_then(|body| body.get("job_id"))
            .and_then(|id| id.as_str())
            .expect("Missing job_id in submit response")
            .to_string()
    }

    /// Poll the status endpoint until the job leaves `processing`
    pub async fn wait_for_terminal(&self, job_id: &str) -> Value {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let response = self
                .client
                .get(&format!("/api/jobs/{}", job_id))
                .await
                .expect("Failed to poll job status");
            response.assert_status(hyper::StatusCode::OK);

            let body = response.body.clone().expect("Missing status body");
            if body.get("status").and_then(|s| s.as_str()) != Some("processing") {
                return body;
            }

            assert!(Instant::now() < deadline, "Job {} never finished", job_id);
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    pub fn upload_count(&self) -> usize {
        std::fs::read_dir(&self.upload_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub fn audio_count(&self) -> usize {
        std::fs::read_dir(&self.audio_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

fn create_app_with_fakes(tts: Arc<FakeSynthesizer>, upload_dir: PathBuf, audio_dir: PathBuf) -> Router {
    let job_repo: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
    let artifact_repo: Arc<dyn ArtifactRepository> = Arc::new(FsArtifactRepository::new(audio_dir));
    let text_extractor = Arc::new(DocumentTextExtractor::new(Box::new(FakePdfExtractor)));

    let runner = Arc::new(JobRunner::new(
        job_repo.clone(),
        text_extractor,
        ChunkExecutor::new(tts, 5),
        AudioAssembler::new(
            AssemblyStrategy::Concatenate,
            SegmentFormat::Mp3,
            artifact_repo.clone(),
        ),
        artifact_repo.clone(),
        PipelineSettings {
            max_chunk_chars: TEST_MAX_CHUNK_CHARS,
            max_document_chars: 1000,
        },
    ));
    let job_service = Arc::new(JobService::new(
        job_repo.clone(),
        runner,
        upload_dir,
        DispatchMode::Background,
        VoiceParams::default(),
        TEST_JOB_TIMEOUT,
    ));

    build_router(HttpDependencies {
        job_repo,
        job_controller: Arc::new(JobController::new(job_service)),
        audio_controller: Arc::new(AudioController::new(artifact_repo)),
        voice_controller: Arc::new(VoiceController::new(Arc::new(FakeVoiceCatalog::new()))),
        max_upload_bytes: TEST_MAX_UPLOAD_BYTES,
        permissive_cors: false,
    })
}
