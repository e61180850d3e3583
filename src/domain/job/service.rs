use super::error::JobServiceError;
use super::model::Job;
use super::runner::{JobRunner, SourceDocument};
use crate::domain::speech::VoiceParams;
use crate::infrastructure::repositories::{is_supported_document, JobRepository};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use uuid::Uuid;

/// Where a submitted job's pipeline runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Spawned as a tokio task; submission returns immediately
    Background,
    /// Awaited before submission returns
    Inline,
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "background" => Ok(Self::Background),
            "inline" => Ok(Self::Inline),
            other => Err(format!("unknown job dispatch mode: {}", other)),
        }
    }
}

/// A document as received from the client
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct JobService {
    job_repo: Arc<dyn JobRepository>,
    runner: Arc<JobRunner>,
    upload_dir: PathBuf,
    dispatch: DispatchMode,
    default_voice: VoiceParams,
    job_timeout: Duration,
}

impl JobService {
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        runner: Arc<JobRunner>,
        upload_dir: impl Into<PathBuf>,
        dispatch: DispatchMode,
        default_voice: VoiceParams,
        job_timeout: Duration,
    ) -> Self {
        Self {
            job_repo,
            runner,
            upload_dir: upload_dir.into(),
            dispatch,
            default_voice,
            job_timeout,
        }
    }
}

#[async_trait]
pub trait JobServiceApi: Send + Sync {
    /// Accept a document for conversion
    ///
    /// This operation:
    /// - Validates the upload (present, non-empty, .pdf or .txt)
    /// - Stores it under the upload directory
    /// - Creates a `queued` job and hands it to the runner
    ///
    /// Returns the job id before the conversion completes (background dispatch)
    async fn submit(
        &self,
        upload: DocumentUpload,
        voice_id: Option<String>,
        engine: Option<String>,
    ) -> Result<Uuid, JobServiceError>;

    /// Current record of a job
    async fn status(&self, job_id: Uuid) -> Result<Job, JobServiceError>;
}

#[async_trait]
impl JobServiceApi for JobService {
    async fn submit(
        &self,
        upload: DocumentUpload,
        voice_id: Option<String>,
        engine: Option<String>,
    ) -> Result<Uuid, JobServiceError> {
        validate_upload(&upload)?;

        let job_id = Uuid::new_v4();
        let voice = VoiceParams::resolve(voice_id, engine, &self.default_voice);
        let document = self.store_upload(job_id, &upload).await?;

        if let Err(e) = self.job_repo.create(job_id).await {
            if let Err(remove_err) = tokio::fs::remove_file(&document.path).await {
                tracing::warn!(
                    job_id = %job_id,
                    error = %remove_err,
                    "Failed to remove upload of rejected job"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            job_id = %job_id,
            file_name = %upload.file_name,
            size_bytes = upload.bytes.len(),
            voice_id = %voice.voice_id,
            engine = %voice.engine,
            dispatch = ?self.dispatch,
            "Job submitted"
        );

        let deadline = self.job_timeout;
        match self.dispatch {
            DispatchMode::Background => {
                let runner = self.runner.clone();
                tokio::spawn(async move {
                    runner.run_with_deadline(job_id, document, voice, deadline).await;
                });
            }
            DispatchMode::Inline => {
                self.runner
                    .run_with_deadline(job_id, document, voice, deadline)
                    .await;
            }
        }

        Ok(job_id)
    }

    async fn status(&self, job_id: Uuid) -> Result<Job, JobServiceError> {
        self.job_repo
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| JobServiceError::NotFound(format!("Job {}", job_id)))
    }
}

impl JobService {
    async fn store_upload(
        &self,
        job_id: Uuid,
        upload: &DocumentUpload,
    ) -> Result<SourceDocument, JobServiceError> {
        let stored_name = format!("{}_{}", job_id, sanitize_file_name(&upload.file_name));
        let path = self.upload_dir.join(&stored_name);

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create upload directory: {}", e))?;
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to store upload {}: {}", path.display(), e))?;

        let artifact_stem = Path::new(&stored_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&stored_name)
            .to_string();

        Ok(SourceDocument {
            path,
            artifact_stem,
        })
    }
}

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid regex"));

fn validate_upload(upload: &DocumentUpload) -> Result<(), JobServiceError> {
    if upload.file_name.trim().is_empty() {
        return Err(JobServiceError::Invalid("No file selected".to_string()));
    }
    if upload.bytes.is_empty() {
        return Err(JobServiceError::Invalid("Uploaded file is empty".to_string()));
    }
    if !is_supported_document(&upload.file_name) {
        return Err(JobServiceError::Invalid(
            "Unsupported file type, expected .pdf or .txt".to_string(),
        ));
    }
    Ok(())
}

/// Base name of a client-supplied file name with anything outside
/// `[A-Za-z0-9._-]` replaced by `_`
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim_start_matches('.');

    let sanitized = UNSAFE_CHARS.replace_all(base, "_").into_owned();
    if sanitized.is_empty() {
        "document".to_string()
    } else {
        sanitized
    }
}
