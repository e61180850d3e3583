use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::job::{
        DocumentUpload, JobService, JobServiceApi, JobStatusResponse, SubmitJobResponse,
    },
    error::{AppError, AppResult},
};

pub struct JobController {
    job_service: Arc<JobService>,
}

impl JobController {
    pub fn new(job_service: Arc<JobService>) -> Self {
        Self { job_service }
    }

    /// POST /api/jobs - Upload a document and start converting it
    ///
    /// Multipart fields: `file` (required), `voice`, `engine`
    pub async fn submit(
        State(controller): State<Arc<JobController>>,
        mut multipart: Multipart,
    ) -> AppResult<(StatusCode, Json<SubmitJobResponse>)> {
        let mut upload: Option<DocumentUpload> = None;
        let mut voice: Option<String> = None;
        let mut engine: Option<String> = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            match field.name() {
                Some("file") => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    upload = Some(DocumentUpload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
                Some("voice") => voice = Some(field.text().await.map_err(multipart_error)?),
                Some("engine") => engine = Some(field.text().await.map_err(multipart_error)?),
                _ => {}
            }
        }

        let upload =
            upload.ok_or_else(|| AppError::BadRequest("No file part in request".to_string()))?;

        let job_id = controller.job_service.submit(upload, voice, engine).await?;
        Ok((StatusCode::ACCEPTED, Json(SubmitJobResponse { job_id })))
    }

    /// GET /api/jobs/{jobId} - Poll a job's status
    pub async fn status(
        State(controller): State<Arc<JobController>>,
        Path(job_id): Path<String>,
    ) -> AppResult<Json<JobStatusResponse>> {
        let job_id = Uuid::parse_str(&job_id)
            .map_err(|_| AppError::BadRequest(format!("Invalid job id: {}", job_id)))?;

        let job = controller.job_service.status(job_id).await?;
        Ok(Json(JobStatusResponse::from(job)))
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}
