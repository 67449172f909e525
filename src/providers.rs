//! Collaborator contracts for the external ML models.
//!
//! The voice-activity detector, embedding extractor and ASR engine are
//! black boxes behind these traits. Their errors propagate unchanged; retry
//! policy belongs to the layer invoking them, not to this crate.

use crate::transcript::{AudioInterval, Transcription};
use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;

/// Voice-activity detection: locate spans of speech within audio.
pub trait SpeechDetector: Send + Sync {
    fn detect(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<AudioInterval>>;
}

/// Speaker embedding extraction over one analysis window. Every call must
/// return a vector of the same dimension.
pub trait EmbeddingExtractor: Send + Sync {
    fn embed(&self, window: &[f32], sample_rate: u32) -> Result<Vec<f32>>;
}

/// Automatic speech recognition over an audio file.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<Transcription>;
}

/// Initialize-once cache for a heavy process-wide model handle.
///
/// The first caller pays the initialization cost; later callers and other
/// threads get the same shared handle. The handle is passed explicitly into
/// stage calls rather than read from ambient state. A failed initialization
/// leaves the cell empty so a later call can retry.
pub struct LazyHandle<T> {
    cell: OnceCell<Arc<T>>,
}

impl<T> LazyHandle<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Get the shared handle, initializing it on first use.
    pub fn get_or_init(&self, init: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        self.cell
            .get_or_try_init(|| init().map(Arc::new))
            .cloned()
    }

    /// The handle, if already initialized.
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }
}

impl<T> Default for LazyHandle<T> {
    fn default() -> Self {
        Self::new()
    }
}
