use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    infrastructure::repositories::ArtifactRepository,
};

pub struct AudioController {
    artifact_repo: Arc<dyn ArtifactRepository>,
}

impl AudioController {
    pub fn new(artifact_repo: Arc<dyn ArtifactRepository>) -> Self {
        Self { artifact_repo }
    }

    /// GET /api/audio/{fileName} - Download a finished artifact
    pub async fn download(
        State(controller): State<Arc<AudioController>>,
        Path(file_name): Path<String>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        if !is_plain_file_name(&file_name) {
            return Err(AppError::BadRequest(format!(
                "Invalid audio file name: {}",
                file_name
            )));
        }

        let audio = controller
            .artifact_repo
            .load(&file_name)
            .await
            .map_err(AppError::Internal)?
            .ok_or_else(|| AppError::NotFound(format!("Audio file {}", file_name)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type_for(&file_name)),
        );

        Ok((StatusCode::OK, headers, Body::from(audio)))
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
}

fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()).as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}
