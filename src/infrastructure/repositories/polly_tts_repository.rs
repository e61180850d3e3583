use super::tts_repository::{TtsRepository, VoiceCatalogRepository};
use crate::domain::speech::{SegmentFormat, VoiceDescription, VoiceParams};
use async_trait::async_trait;
use aws_sdk_polly::{
    error::DisplayErrorContext,
    types::{Engine, LanguageCode, OutputFormat, Voice, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;

/// AWS Polly implementation of TTS repository
pub struct PollyTtsRepository {
    polly_client: Arc<PollyClient>,
    output_format: SegmentFormat,
}

impl PollyTtsRepository {
    pub fn new(polly_client: Arc<PollyClient>, output_format: SegmentFormat) -> Self {
        Self {
            polly_client,
            output_format,
        }
    }

    /// Polly output format and, for PCM, the sample rate to request
    fn polly_output(format: SegmentFormat) -> (OutputFormat, Option<String>) {
        match format {
            SegmentFormat::Mp3 => (OutputFormat::Mp3, None),
            SegmentFormat::OggVorbis => (OutputFormat::OggVorbis, None),
            SegmentFormat::Pcm { sample_rate } => (OutputFormat::Pcm, Some(sample_rate.to_string())),
        }
    }

    fn describe_voice(voice: &Voice) -> Option<VoiceDescription> {
        Some(VoiceDescription {
            id: voice.id()?.as_str().to_string(),
            gender: voice.gender().map(|g| g.as_str().to_string()),
            language_code: voice
                .language_code()
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
            language_name: voice.language_name().map(str::to_string),
            supported_engines: voice
                .supported_engines()
                .iter()
                .map(|e| e.as_str().to_string())
                .collect(),
        })
    }
}

#[async_trait]
impl TtsRepository for PollyTtsRepository {
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Vec<u8>, String> {
        let start_time = std::time::Instant::now();
        let (output_format, sample_rate) = Self::polly_output(self.output_format);
        let voice_id = VoiceId::from(voice.voice_id.as_str());
        let engine = Engine::from(voice.engine.as_str());

        tracing::debug!(
            voice_id = ?voice_id,
            engine = ?engine,
            output_format = ?output_format,
            text_length = text.len(),
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(text)
            .voice_id(voice_id)
            .engine(engine)
            .output_format(output_format)
            .set_sample_rate(sample_rate)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    voice_id = %voice.voice_id,
                    engine = %voice.engine,
                    text_length = text.len(),
                    "AWS Polly synthesize_speech failed"
                );
                format!("AWS Polly error: {}", DisplayErrorContext(&e))
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            format!("Failed to read audio stream: {}", e)
        })?;

        let audio_bytes = audio_stream.into_bytes().to_vec();

        tracing::debug!(
            provider = "polly",
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.chars().count(),
            audio_size_bytes = audio_bytes.len(),
            "Polly synthesis completed"
        );

        Ok(audio_bytes)
    }
}

#[async_trait]
impl VoiceCatalogRepository for PollyTtsRepository {
    async fn list_voices(&self, language_code: Option<&str>) -> Result<Vec<VoiceDescription>, String> {
        let mut voices = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .polly_client
                .describe_voices()
                .set_language_code(language_code.map(LanguageCode::from))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(
                        error = %DisplayErrorContext(&e),
                        language_code = ?language_code,
                        "AWS Polly describe_voices failed"
                    );
                    format!("AWS Polly error: {}", DisplayErrorContext(&e))
                })?;

            voices.extend(response.voices().iter().filter_map(Self::describe_voice));

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        tracing::info!(
            voice_count = voices.len(),
            language_code = ?language_code,
            "Fetched Polly voice catalog"
        );

        Ok(voices)
    }
}
