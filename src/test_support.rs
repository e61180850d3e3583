//! Fakes for the collaborator traits, shared by unit tests.

use crate::domain::speech::VoiceParams;
use crate::infrastructure::repositories::{DocumentTextExtractor, TextExtractor, TtsRepository};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Synthesizer that answers `audio:<text>` after a configurable delay,
/// with per-text failures, and records call concurrency.
#[derive(Default)]
pub struct FakeTtsRepository {
    default_delay: Duration,
    delays: Mutex<HashMap<String, Duration>>,
    failures: Mutex<HashMap<String, String>>,
    empty: Mutex<HashSet<String>>,
    completed: Mutex<Vec<String>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTtsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_delay(delay: Duration) -> Self {
        Self {
            default_delay: delay,
            ..Self::default()
        }
    }

    pub fn delay(&self, text: &str, delay: Duration) {
        self.delays.lock().insert(text.to_string(), delay);
    }

    pub fn fail(&self, text: &str, cause: &str) {
        self.failures.lock().insert(text.to_string(), cause.to_string());
    }

    pub fn respond_empty(&self, text: &str) {
        self.empty.lock().insert(text.to_string());
    }

    /// Texts in the order their synthesis finished
    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the call is dropped mid-way
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TtsRepository for FakeTtsRepository {
    async fn synthesize(&self, text: &str, _voice: &VoiceParams) -> Result<Vec<u8>, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let delay = self
            .delays
            .lock()
            .get(text)
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.completed.lock().push(text.to_string());

        if let Some(cause) = self.failures.lock().get(text) {
            return Err(cause.clone());
        }
        if self.empty.lock().contains(text) {
            return Ok(Vec::new());
        }
        Ok(format!("audio:{}", text).into_bytes())
    }
}

struct PdfUnavailable;

#[async_trait]
impl TextExtractor for PdfUnavailable {
    async fn extract_text(&self, path: &Path) -> Result<String, String> {
        Err(format!("PDF extraction disabled for {}", path.display()))
    }
}

/// The production extractor with PDF support stubbed out; `.txt` files are read for real
pub fn text_extractor() -> DocumentTextExtractor {
    DocumentTextExtractor::new(Box::new(PdfUnavailable))
}
