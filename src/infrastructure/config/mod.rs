use crate::domain::job::{DispatchMode, DEFAULT_MAX_DOCUMENT_CHARS};
use crate::domain::speech::voice::{DEFAULT_ENGINE, DEFAULT_VOICE_ID};
use crate::domain::speech::{
    AssemblyStrategy, SegmentFormat, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_MAX_CHUNK_CHARS,
};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_JOB_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent: jobs are kept in process memory
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub aws_region: String,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Storage
    pub upload_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub pdfium_library_path: Option<PathBuf>,
    // Pipeline
    pub max_chunk_chars: usize,
    pub concurrency_limit: usize,
    pub max_document_chars: usize,
    pub max_upload_bytes: usize,
    pub audio_assembly: AssemblyStrategy,
    pub job_dispatch: DispatchMode,
    /// Whole-run deadline for one job
    pub job_timeout: Duration,
    // Polly
    pub polly_output_format: SegmentFormat,
    pub polly_max_attempts: u32,
    pub default_voice: String,
    pub default_engine: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let polly_sample_rate = match optional_var("POLLY_SAMPLE_RATE") {
            Some(rate) => Some(rate.parse::<u32>()?),
            None => None,
        };

        let config = Config {
            database_url: optional_var("DATABASE_URL"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            environment: match env::var("ENVIRONMENT").as_deref() {
                Ok("production") => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            audio_dir: env::var("AUDIO_DIR")
                .unwrap_or_else(|_| "static/audio".to_string())
                .into(),
            pdfium_library_path: optional_var("PDFIUM_LIBRARY_PATH").map(PathBuf::from),
            max_chunk_chars: env::var("MAX_CHUNK_CHARS")
                .unwrap_or_else(|_| DEFAULT_MAX_CHUNK_CHARS.to_string())
                .parse()?,
            concurrency_limit: env::var("CONCURRENCY_LIMIT")
                .unwrap_or_else(|_| DEFAULT_CONCURRENCY_LIMIT.to_string())
                .parse()?,
            max_document_chars: env::var("MAX_DOCUMENT_CHARS")
                .unwrap_or_else(|_| DEFAULT_MAX_DOCUMENT_CHARS.to_string())
                .parse()?,
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| (25 * 1024 * 1024).to_string())
                .parse()?,
            audio_assembly: env::var("AUDIO_ASSEMBLY")
                .unwrap_or_else(|_| "transcode".to_string())
                .parse()?,
            job_dispatch: env::var("JOB_DISPATCH")
                .unwrap_or_else(|_| "background".to_string())
                .parse()?,
            job_timeout: Duration::from_secs(
                env::var("JOB_TIMEOUT_SECS")
                    .unwrap_or_else(|_| DEFAULT_JOB_TIMEOUT_SECS.to_string())
                    .parse()?,
            ),
            polly_output_format: env::var("POLLY_OUTPUT_FORMAT")
                .unwrap_or_else(|_| "mp3".to_string())
                .parse::<SegmentFormat>()?
                .with_sample_rate(polly_sample_rate),
            polly_max_attempts: env::var("POLLY_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            default_voice: env::var("DEFAULT_VOICE").unwrap_or_else(|_| DEFAULT_VOICE_ID.to_string()),
            default_engine: env::var("DEFAULT_ENGINE")
                .unwrap_or_else(|_| DEFAULT_ENGINE.to_string()),
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

/// Unset and blank variables are both treated as absent
fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
