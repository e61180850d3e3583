pub mod artifact_repository;
pub mod document_repository;
pub mod job_repository;
pub mod memory_job_repository;
pub mod polly_tts_repository;
pub mod tts_repository;

pub use artifact_repository::{ArtifactRepository, FsArtifactRepository};
pub use document_repository::{
    is_supported_document, DocumentTextExtractor, PdfTextExtractor, TextExtractor,
};
pub use job_repository::{JobRepository, PgJobRepository};
pub use memory_job_repository::InMemoryJobRepository;
pub use polly_tts_repository::PollyTtsRepository;
pub use tts_repository::{TtsRepository, VoiceCatalogRepository};
