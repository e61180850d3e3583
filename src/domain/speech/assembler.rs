use super::codec::{decode_segment, encode_wav, PcmAudio, SegmentFormat};
use super::error::PipelineError;
use crate::infrastructure::repositories::ArtifactRepository;
use std::str::FromStr;
use std::sync::Arc;

/// How ordered segments become one audio file.
///
/// Byte concatenation is only sound for formats whose framing tolerates it
/// (MP3 frames, raw PCM). Transcoding decodes every segment, joins the
/// samples and encodes a single WAV, which is safe for any backend format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyStrategy {
    Concatenate,
    Transcode,
}

impl FromStr for AssemblyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "concatenate" | "concat" => Ok(Self::Concatenate),
            "transcode" => Ok(Self::Transcode),
            other => Err(format!("unknown audio assembly strategy: {}", other)),
        }
    }
}

/// The assembled output of a successful job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub size_bytes: usize,
}

pub struct AudioAssembler {
    strategy: AssemblyStrategy,
    segment_format: SegmentFormat,
    artifact_repo: Arc<dyn ArtifactRepository>,
}

impl AudioAssembler {
    pub fn new(
        strategy: AssemblyStrategy,
        segment_format: SegmentFormat,
        artifact_repo: Arc<dyn ArtifactRepository>,
    ) -> Self {
        Self {
            strategy,
            segment_format,
            artifact_repo,
        }
    }

    pub fn artifact_extension(&self) -> &'static str {
        match self.strategy {
            AssemblyStrategy::Concatenate => self.segment_format.extension(),
            AssemblyStrategy::Transcode => "wav",
        }
    }

    /// Merge the segments in order and write the result as `<output_stem>.<ext>`.
    ///
    /// The artifact only exists once this returns `Ok`.
    pub async fn assemble(
        &self,
        segments: Vec<Vec<u8>>,
        output_stem: &str,
    ) -> Result<Artifact, PipelineError> {
        let segment_count = segments.len();
        let strategy = self.strategy;
        let format = self.segment_format;

        let audio = tokio::task::spawn_blocking(move || merge_segments(strategy, format, &segments))
            .await
            .map_err(|e| {
                PipelineError::InternalConsistency(format!("assembly task panicked: {}", e))
            })??;

        let name = format!("{}.{}", output_stem, self.artifact_extension());
        self.artifact_repo
            .store(&name, &audio)
            .await
            .map_err(PipelineError::Resource)?;

        tracing::info!(
            artifact = %name,
            strategy = ?strategy,
            segment_count = segment_count,
            size_bytes = audio.len(),
            "Audio artifact written"
        );

        Ok(Artifact {
            name,
            size_bytes: audio.len(),
        })
    }
}

/// Join segments in order using `strategy`
pub fn merge_segments(
    strategy: AssemblyStrategy,
    format: SegmentFormat,
    segments: &[Vec<u8>],
) -> Result<Vec<u8>, PipelineError> {
    if segments.is_empty() {
        return Err(PipelineError::InternalConsistency(
            "no audio segments to assemble".to_string(),
        ));
    }
    if let Some(index) = segments.iter().position(Vec::is_empty) {
        return Err(PipelineError::InternalConsistency(format!(
            "audio segment {} is missing",
            index
        )));
    }

    match strategy {
        AssemblyStrategy::Concatenate => Ok(segments.concat()),
        AssemblyStrategy::Transcode => transcode(format, segments),
    }
}

fn transcode(format: SegmentFormat, segments: &[Vec<u8>]) -> Result<Vec<u8>, PipelineError> {
    let mut merged: Option<PcmAudio> = None;

    for (index, segment) in segments.iter().enumerate() {
        let decoded = decode_segment(format, segment)
            .map_err(|e| PipelineError::Assembly(format!("segment {}: {}", index, e)))?;

        match merged.as_mut() {
            None => merged = Some(decoded),
            Some(audio) if audio.spec == decoded.spec => {
                audio.samples.extend_from_slice(&decoded.samples)
            }
            Some(audio) => {
                return Err(PipelineError::Assembly(format!(
                    "segment {} is {} Hz/{} ch but earlier segments are {} Hz/{} ch",
                    index,
                    decoded.spec.sample_rate,
                    decoded.spec.channels,
                    audio.spec.sample_rate,
                    audio.spec.channels
                )))
            }
        }
    }

    let audio = merged.ok_or_else(|| {
        PipelineError::InternalConsistency("no audio segments to assemble".to_string())
    })?;
    encode_wav(&audio).map_err(PipelineError::Assembly)
}
