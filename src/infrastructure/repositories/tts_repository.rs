use crate::domain::speech::{VoiceDescription, VoiceParams};
use async_trait::async_trait;

/// Repository for TTS synthesis operations.
/// Abstracts the underlying TTS provider (AWS Polly, or a fake in tests).
///
/// One call is one request to the provider. Implementations do not split
/// text, cache, or retry beyond what the provider's own client does.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize one chunk of text with the given voice
    ///
    /// Returns the raw audio bytes in the provider's configured output format
    ///
    /// # Errors
    /// Returns a human-readable cause if the provider rejects the request or
    /// cannot be reached
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Vec<u8>, String>;
}

/// Lists the voices a provider offers
#[async_trait]
pub trait VoiceCatalogRepository: Send + Sync {
    /// All voices, optionally restricted to one language code (e.g. `en-US`)
    async fn list_voices(&self, language_code: Option<&str>) -> Result<Vec<VoiceDescription>, String>;
}
