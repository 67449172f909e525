//! Speaker diarization: windowing, clustering, label mapping and smoothing.
//!
//! The embedding extractor and voice-activity detector are external
//! collaborators reached through the traits in [`crate::providers`]; this
//! module owns everything between their outputs and the speaker labels on a
//! transcription.

pub mod clustering;
pub mod config;
pub mod labeling;
pub mod smoothing;
pub mod window;

pub use clustering::{DiarizationSegment, SpeakerClusterer};
pub use config::{ClusterConfig, DiarizationConfig, WindowConfig};
pub use window::WindowSegmenter;

use crate::providers::EmbeddingExtractor;
use crate::transcript::AudioInterval;
use thiserror::Error;

/// Errors that can occur during diarization.
#[derive(Debug, Error)]
pub enum DiarizationError {
    #[error("malformed interval: start {start} is not before end {end}")]
    MalformedInterval { start: f64, end: f64 },

    #[error("embedding {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("requested speaker count must be at least 1")]
    InvalidClusterCount,

    #[error("embedding extraction failed")]
    Extractor(#[from] anyhow::Error),
}

/// Run windowing, embedding extraction and clustering over a waveform.
///
/// Returns sorted, non-overlapping diarization segments. An empty result
/// means no usable embeddings were produced (signal too short, or no window
/// overlapped detected speech); the caller is expected to apply the
/// single-speaker fallback in that case rather than treat it as failure.
pub fn diarize_waveform(
    samples: &[f32],
    sample_rate: u32,
    speech: &[AudioInterval],
    extractor: &dyn EmbeddingExtractor,
    config: &DiarizationConfig,
) -> Result<Vec<DiarizationSegment>, DiarizationError> {
    let segmenter = WindowSegmenter::new(config.window.clone());
    let windows = segmenter.segment(samples, sample_rate);
    tracing::debug!(
        "segmented {:.2}s of audio into {} windows",
        samples.len() as f64 / sample_rate as f64,
        windows.len()
    );

    // Speech detection gates embedding extraction, not windowing.
    let mut intervals = Vec::new();
    let mut embeddings = Vec::new();
    for w in &windows {
        if !w.overlaps_speech(speech) {
            continue;
        }
        let embedding = extractor.embed(w.samples, sample_rate)?;
        intervals.push(w.interval);
        embeddings.push(embedding);
    }

    if embeddings.is_empty() {
        tracing::debug!("no usable embeddings; deferring to single-speaker fallback");
        return Ok(Vec::new());
    }

    let clusterer = SpeakerClusterer::new(config.cluster.clone());
    let labels = clusterer.cluster(&embeddings)?;
    let segments = clustering::segments_from_labels(&intervals, &labels);

    tracing::debug!(
        "diarization produced {} segments from {} embeddings",
        segments.len(),
        embeddings.len()
    );
    Ok(segments)
}
