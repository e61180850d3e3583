use super::model::{JobState, JobTransition};
use crate::domain::speech::{
    split_into_chunks, Artifact, AudioAssembler, ChunkExecutor, PipelineError, VoiceParams,
    DEFAULT_MAX_CHUNK_CHARS,
};
use crate::infrastructure::repositories::{ArtifactRepository, JobRepository, TextExtractor};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Monthly character allowance of the synthesis account, applied per document
pub const DEFAULT_MAX_DOCUMENT_CHARS: usize = 4_500_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_chunk_chars: usize,
    pub max_document_chars: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            max_document_chars: DEFAULT_MAX_DOCUMENT_CHARS,
        }
    }
}

/// An uploaded document waiting to be converted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    /// File name of the artifact, without extension
    pub artifact_stem: String,
}

/// Drives one job from `queued` to a terminal state.
///
/// The runner owns no hosting decision: callers either await `run` or spawn it.
/// Whatever happens, the source document is removed before `run` returns.
pub struct JobRunner {
    job_repo: Arc<dyn JobRepository>,
    extractor: Arc<dyn TextExtractor>,
    executor: ChunkExecutor,
    assembler: AudioAssembler,
    artifact_repo: Arc<dyn ArtifactRepository>,
    settings: PipelineSettings,
}

impl JobRunner {
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        extractor: Arc<dyn TextExtractor>,
        executor: ChunkExecutor,
        assembler: AudioAssembler,
        artifact_repo: Arc<dyn ArtifactRepository>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            job_repo,
            extractor,
            executor,
            assembler,
            artifact_repo,
            settings,
        }
    }

    /// Run the whole pipeline for `job_id` and return the state it ended in
    pub async fn run(&self, job_id: Uuid, document: SourceDocument, voice: VoiceParams) -> JobState {
        let start_time = Instant::now();
        tracing::info!(
            job_id = %job_id,
            document = %document.path.display(),
            voice_id = %voice.voice_id,
            engine = %voice.engine,
            "Job started"
        );

        let state = match self.job_repo.transition(job_id, JobTransition::Processing).await {
            Ok(_) => self.process(job_id, &document, &voice).await,
            Err(e) => {
                let err = PipelineError::Resource(format!("could not mark job processing: {}", e));
                self.fail(job_id, &err).await
            }
        };

        self.cleanup(job_id, &document).await;

        tracing::info!(
            job_id = %job_id,
            state = %state,
            latency_ms = start_time.elapsed().as_millis(),
            "Job completed"
        );

        state
    }

    /// `run` bounded by `deadline`.
    ///
    /// On expiry the in-flight pipeline is dropped, the job is marked `failed`
    /// and the source document is removed.
    pub async fn run_with_deadline(
        &self,
        job_id: Uuid,
        document: SourceDocument,
        voice: VoiceParams,
        deadline: Duration,
    ) -> JobState {
        match tokio::time::timeout(deadline, self.run(job_id, document.clone(), voice)).await {
            Ok(state) => state,
            Err(_) => {
                let state = self.fail(job_id, &PipelineError::Timeout(deadline)).await;
                self.cleanup(job_id, &document).await;
                state
            }
        }
    }

    async fn process(&self, job_id: Uuid, document: &SourceDocument, voice: &VoiceParams) -> JobState {
        let artifact = match self.produce_artifact(job_id, document, voice).await {
            Ok(artifact) => artifact,
            Err(err) => return self.fail(job_id, &err).await,
        };

        let finished = JobTransition::Finished {
            result_ref: artifact.name.clone(),
        };
        match self.job_repo.transition(job_id, finished).await {
            Ok(job) => job.state,
            Err(e) => {
                // The write may have committed before the error surfaced
                if self.is_recorded_finished(job_id, &artifact.name).await {
                    tracing::warn!(
                        job_id = %job_id,
                        artifact = %artifact.name,
                        error = %e,
                        "Finished write reported an error but the job is recorded as finished"
                    );
                    return JobState::Finished;
                }

                tracing::error!(
                    job_id = %job_id,
                    artifact = %artifact.name,
                    error = %e,
                    "Failed to record finished job, discarding artifact"
                );
                if let Err(remove_err) = self.artifact_repo.remove(&artifact.name).await {
                    tracing::warn!(
                        job_id = %job_id,
                        artifact = %artifact.name,
                        error = %remove_err,
                        "Failed to remove orphaned artifact"
                    );
                }
                let err = PipelineError::Resource(format!("could not record finished job: {}", e));
                self.fail(job_id, &err).await
            }
        }
    }

    async fn is_recorded_finished(&self, job_id: Uuid, artifact_name: &str) -> bool {
        match self.job_repo.find_by_id(job_id).await {
            Ok(Some(job)) => {
                job.state == JobState::Finished && job.result_ref.as_deref() == Some(artifact_name)
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Failed to re-read job after finish write");
                false
            }
        }
    }

    async fn produce_artifact(
        &self,
        job_id: Uuid,
        document: &SourceDocument,
        voice: &VoiceParams,
    ) -> Result<Artifact, PipelineError> {
        let text = self
            .extractor
            .extract_text(&document.path)
            .await
            .map_err(|e| PipelineError::Input(format!("Failed to extract text: {}", e)))?;

        if text.trim().is_empty() {
            return Err(PipelineError::Input(
                "No text found in document (empty text)".to_string(),
            ));
        }

        let char_count = text.chars().count();
        if char_count > self.settings.max_document_chars {
            return Err(PipelineError::Input(format!(
                "Document has {} characters, over the limit of {}",
                char_count, self.settings.max_document_chars
            )));
        }

        let chunks = split_into_chunks(&text, self.settings.max_chunk_chars);
        tracing::info!(
            job_id = %job_id,
            text_chars = char_count,
            chunk_count = chunks.len(),
            max_chunk_chars = self.settings.max_chunk_chars,
            "Document chunked"
        );

        let segments = self.executor.execute(&chunks, voice).await?;
        self.assembler.assemble(segments, &document.artifact_stem).await
    }

    /// Record the failure; the returned state is what the run ended in
    async fn fail(&self, job_id: Uuid, err: &PipelineError) -> JobState {
        tracing::warn!(
            job_id = %job_id,
            error_kind = err.kind(),
            error = %err,
            "Job failed"
        );

        let failed = JobTransition::Failed {
            error: err.to_string(),
        };
        match self.job_repo.transition(job_id, failed).await {
            Ok(job) => job.state,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Failed to record job failure");
                // A terminal state already on record wins over the failure
                match self.job_repo.find_by_id(job_id).await {
                    Ok(Some(job)) if job.state.is_terminal() => job.state,
                    _ => JobState::Failed,
                }
            }
        }
    }

    async fn cleanup(&self, job_id: Uuid, document: &SourceDocument) {
        match tokio::fs::remove_file(&document.path).await {
            Ok(()) => tracing::debug!(job_id = %job_id, "Source document removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                job_id = %job_id,
                document = %document.path.display(),
                error = %e,
                "Failed to remove source document"
            ),
        }
    }
}
