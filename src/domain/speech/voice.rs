use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_VOICE_ID: &str = "Joanna";
pub const DEFAULT_ENGINE: &str = "neural";

/// Voice identity and engine tier forwarded to the synthesis backend.
///
/// Neither field is validated locally: the backend is the only authority on
/// which voice/engine combinations exist, and rejects unknown ones per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceParams {
    pub voice_id: String,
    pub engine: String,
}

impl VoiceParams {
    pub fn new(voice_id: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            engine: engine.into(),
        }
    }

    /// Fill blank or missing request values from `defaults`
    pub fn resolve(voice_id: Option<String>, engine: Option<String>, defaults: &VoiceParams) -> Self {
        let pick = |value: Option<String>, fallback: &str| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        Self {
            voice_id: pick(voice_id, &defaults.voice_id),
            engine: pick(engine, &defaults.engine),
        }
    }
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self::new(DEFAULT_VOICE_ID, DEFAULT_ENGINE)
    }
}

/// One voice offered by the synthesis backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceDescription {
    pub id: String,
    pub gender: Option<String>,
    pub language_code: String,
    pub language_name: Option<String>,
    pub supported_engines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub supported_engines: Vec<String>,
}

/// Voices available for one language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageVoices {
    pub language: String,
    pub voices: Vec<VoiceSummary>,
}

/// Response for GET /api/voices, keyed by language code
pub type VoiceCatalogResponse = BTreeMap<String, LanguageVoices>;

pub fn group_by_language(voices: Vec<VoiceDescription>) -> VoiceCatalogResponse {
    let mut catalog = VoiceCatalogResponse::new();

    for voice in voices {
        let entry = catalog
            .entry(voice.language_code.clone())
            .or_insert_with(|| LanguageVoices {
                language: voice
                    .language_name
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                voices: Vec::new(),
            });

        entry.voices.push(VoiceSummary {
            id: voice.id,
            gender: voice.gender,
            supported_engines: voice.supported_engines,
        });
    }

    catalog
}
