use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum JobServiceError {
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<AppError> for JobServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(msg) => JobServiceError::NotFound(msg),
            AppError::BadRequest(msg) => JobServiceError::Invalid(msg),
            _ => JobServiceError::Dependency(err.to_string()),
        }
    }
}

impl From<JobServiceError> for AppError {
    fn from(err: JobServiceError) -> Self {
        match err {
            JobServiceError::Invalid(msg) => AppError::BadRequest(msg),
            JobServiceError::NotFound(msg) => AppError::NotFound(msg),
            JobServiceError::Dependency(msg) => AppError::ExternalService(msg),
            JobServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
