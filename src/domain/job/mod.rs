pub mod error;
pub mod model;
pub mod runner;
pub mod service;

pub use error::JobServiceError;
pub use model::{
    InvalidTransition, Job, JobState, JobStatusResponse, JobTransition, SubmitJobResponse,
};
pub use runner::{JobRunner, PipelineSettings, SourceDocument, DEFAULT_MAX_DOCUMENT_CHARS};
pub use service::{DispatchMode, DocumentUpload, JobService, JobServiceApi};
