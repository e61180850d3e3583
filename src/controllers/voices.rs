use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    domain::speech::voice::{group_by_language, VoiceCatalogResponse},
    error::{AppError, AppResult},
    infrastructure::repositories::VoiceCatalogRepository,
};

#[derive(Debug, Deserialize)]
pub struct VoiceQuery {
    pub language: Option<String>,
}

pub struct VoiceController {
    voice_catalog: Arc<dyn VoiceCatalogRepository>,
}

impl VoiceController {
    pub fn new(voice_catalog: Arc<dyn VoiceCatalogRepository>) -> Self {
        Self { voice_catalog }
    }

    /// GET /api/voices - Available voices grouped by language code
    pub async fn list_voices(
        State(controller): State<Arc<VoiceController>>,
        Query(query): Query<VoiceQuery>,
    ) -> AppResult<Json<VoiceCatalogResponse>> {
        let language = query
            .language
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty());

        let voices = controller
            .voice_catalog
            .list_voices(language)
            .await
            .map_err(AppError::ExternalService)?;

        Ok(Json(group_by_language(voices)))
    }
}
