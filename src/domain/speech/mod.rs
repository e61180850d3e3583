//! Text-to-speech pipeline: chunking, concurrent synthesis and reassembly.

pub mod assembler;
pub mod chunker;
pub mod codec;
pub mod error;
pub mod executor;
pub mod voice;

pub use assembler::{Artifact, AssemblyStrategy, AudioAssembler};
pub use chunker::{split_into_chunks, Chunk, DEFAULT_MAX_CHUNK_CHARS};
pub use codec::SegmentFormat;
pub use error::PipelineError;
pub use executor::{ChunkExecutor, DEFAULT_CONCURRENCY_LIMIT};
pub use voice::{VoiceDescription, VoiceParams};
