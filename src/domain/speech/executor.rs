use super::chunker::Chunk;
use super::error::PipelineError;
use super::voice::VoiceParams;
use crate::infrastructure::repositories::TtsRepository;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;

/// Recommended parallelism against a rate-limited synthesis backend
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;

/// Outcome of synthesizing one chunk, tagged with its sequence index
#[derive(Debug)]
struct ChunkResult {
    index: usize,
    outcome: Result<Vec<u8>, String>,
}

/// Fans chunk synthesis out to the TTS backend under a concurrency cap and
/// fans the results back in by sequence index.
pub struct ChunkExecutor {
    tts_repo: Arc<dyn TtsRepository>,
    concurrency_limit: usize,
}

impl ChunkExecutor {
    pub fn new(tts_repo: Arc<dyn TtsRepository>, concurrency_limit: usize) -> Self {
        Self {
            tts_repo,
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Synthesize every chunk and return the audio segments in chunk order.
    ///
    /// Completion order never affects output order: each result lands in the
    /// slot of its chunk index. The first failure stops further dispatch and
    /// is returned immediately; chunks still in flight are dropped.
    pub async fn execute(
        &self,
        chunks: &[Chunk],
        voice: &VoiceParams,
    ) -> Result<Vec<Vec<u8>>, PipelineError> {
        let start_time = Instant::now();
        let mut slots: Vec<Option<Vec<u8>>> = vec![None; chunks.len()];

        tracing::info!(
            chunk_count = chunks.len(),
            concurrency_limit = self.concurrency_limit,
            voice_id = %voice.voice_id,
            engine = %voice.engine,
            "Dispatching chunks for synthesis"
        );

        // Dispatched futures own their inputs and must stay `Send`
        let mut results = stream::iter(chunks.iter().cloned())
            .map(|chunk| synthesize_chunk(self.tts_repo.clone(), chunk, voice.clone()))
            .buffer_unordered(self.concurrency_limit);

        while let Some(ChunkResult { index, outcome }) = results.next().await {
            match outcome {
                Ok(audio) => {
                    let slot = slots.get_mut(index).ok_or_else(|| {
                        PipelineError::InternalConsistency(format!(
                            "chunk index {} is outside the {} dispatched chunks",
                            index,
                            chunks.len()
                        ))
                    })?;
                    *slot = Some(audio);
                }
                Err(cause) => {
                    tracing::warn!(
                        chunk_index = index,
                        error = %cause,
                        "Chunk synthesis failed, abandoning remaining chunks"
                    );
                    return Err(PipelineError::Backend { index, cause });
                }
            }
        }

        let segments = collect_slots(slots)?;

        tracing::info!(
            chunk_count = segments.len(),
            audio_size_bytes = segments.iter().map(Vec::len).sum::<usize>(),
            latency_ms = start_time.elapsed().as_millis(),
            "All chunks synthesized"
        );

        Ok(segments)
    }
}

async fn synthesize_chunk(
    tts_repo: Arc<dyn TtsRepository>,
    chunk: Chunk,
    voice: VoiceParams,
) -> ChunkResult {
    let start_time = Instant::now();
    tracing::debug!(
        chunk_index = chunk.index,
        chunk_chars = chunk.char_count(),
        "Synthesizing chunk"
    );

    let outcome = match tts_repo.synthesize(&chunk.text, &voice).await {
        Ok(audio) if audio.is_empty() => Err("backend returned no audio".to_string()),
        other => other,
    };

    if let Ok(audio) = &outcome {
        tracing::debug!(
            chunk_index = chunk.index,
            audio_size = audio.len(),
            latency_ms = start_time.elapsed().as_millis(),
            "Chunk synthesized"
        );
    }

    ChunkResult {
        index: chunk.index,
        outcome,
    }
}

/// Unwrap the slot array, refusing to paper over a hole
fn collect_slots(slots: Vec<Option<Vec<u8>>>) -> Result<Vec<Vec<u8>>, PipelineError> {
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| {
                PipelineError::InternalConsistency(format!("no audio recorded for chunk {}", index))
            })
        })
        .collect()
}
