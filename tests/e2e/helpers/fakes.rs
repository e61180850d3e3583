use async_trait::async_trait;
use docvoice_backend::domain::speech::{VoiceDescription, VoiceParams};
use docvoice_backend::infrastructure::repositories::{
    TextExtractor, TtsRepository, VoiceCatalogRepository,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Stands in for Polly: returns `audio:<text>` for every chunk unless told otherwise
#[derive(Default)]
pub struct FakeSynthesizer {
    failures: Mutex<HashMap<String, String>>,
    delays: Mutex<HashMap<String, Duration>>,
    voices_used: Mutex<Vec<VoiceParams>>,
    calls: AtomicUsize,
}

impl FakeSynthesizer {
    pub fn fail(&self, text: &str, cause: &str) {
        self.failures.lock().insert(text.to_string(), cause.to_string());
    }

    #[allow(dead_code)]
    pub fn delay(&self, text: &str, delay: Duration) {
        self.delays.lock().insert(text.to_string(), delay);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn voices_used(&self) -> Vec<VoiceParams> {
        self.voices_used.lock().clone()
    }
}

#[async_trait]
impl TtsRepository for FakeSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Vec<u8>, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.voices_used.lock().push(voice.clone());

        let delay = self.delays.lock().get(text).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().get(text).cloned();
        match failure {
            Some(cause) => Err(cause),
            None => Ok(format!("audio:{}", text).into_bytes()),
        }
    }
}

/// Voice catalogue with a fixed set of voices
pub struct FakeVoiceCatalog {
    voices: Vec<VoiceDescription>,
}

impl FakeVoiceCatalog {
    pub fn new() -> Self {
        let voice = |id: &str, gender: &str, code: &str, name: &str, engines: &[&str]| {
            VoiceDescription {
                id: id.to_string(),
                gender: Some(gender.to_string()),
                language_code: code.to_string(),
                language_name: Some(name.to_string()),
                supported_engines: engines.iter().map(|e| e.to_string()).collect(),
            }
        };

        Self {
            voices: vec![
                voice("Joanna", "Female", "en-US", "US English", &["neural", "standard"]),
                voice("Matthew", "Male", "en-US", "US English", &["neural", "standard"]),
                voice("Lucia", "Female", "es-ES", "Castilian Spanish", &["neural"]),
            ],
        }
    }
}

#[async_trait]
impl VoiceCatalogRepository for FakeVoiceCatalog {
    async fn list_voices(&self, language_code: Option<&str>) -> Result<Vec<VoiceDescription>, String> {
        Ok(self
            .voices
            .iter()
            .filter(|voice| language_code.map_or(true, |code| voice.language_code == code))
            .cloned()
            .collect())
    }
}

/// Stands in for PDFium, which is not installed on test machines
pub struct FakePdfExtractor;

#[async_trait]
impl TextExtractor for FakePdfExtractor {
    async fn extract_text(&self, _path: &Path) -> Result<String, String> {
        Ok("first page\n\x0csecond page\n\x0c".to_string())
    }
}
