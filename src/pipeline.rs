//! Pipeline stage composition.
//!
//! Each stage is a pure transform over an owned [`Transcription`]: it takes
//! the value, returns an updated one, and advances the lifecycle stage. A
//! failed stage returns an error and the caller discards that stage's
//! partial output; there are no partial speaker-label commits.

use crate::diarization::{self, labeling, smoothing, DiarizationConfig, DiarizationError};
use crate::proofing;
use crate::providers::{EmbeddingExtractor, SpeechDetector, SpeechRecognizer};
use crate::transcript::{PipelineStage, Transcription};
use crate::verification::{separate_by_speaker, verify_against, VerificationError};
use anyhow::{ensure, Context, Result};
use std::sync::Arc;

/// Configuration shared by the pipeline stages.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub diarization: DiarizationConfig,

    /// Aligner lookup tolerance in seconds.
    pub tolerance_secs: f64,

    /// Log-probability threshold for the proofing stage.
    pub confidence_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            diarization: DiarizationConfig::default(),
            tolerance_secs: crate::verification::DEFAULT_TOLERANCE_SECS,
            confidence_threshold: proofing::DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Attribute a speaker to every transcript segment.
///
/// When no usable embeddings come out of the waveform the whole
/// transcription is attributed to a single speaker instead of failing.
pub fn diarize(
    mut transcription: Transcription,
    samples: &[f32],
    sample_rate: u32,
    detector: &dyn SpeechDetector,
    extractor: &dyn EmbeddingExtractor,
    config: &PipelineConfig,
) -> Result<Transcription> {
    ensure!(
        transcription.stage == PipelineStage::Raw,
        "diarization must run on a raw transcription (stage is {:?})",
        transcription.stage
    );
    for segment in &transcription.segments {
        if !segment.interval.is_well_formed() {
            return Err(DiarizationError::MalformedInterval {
                start: segment.interval.start,
                end: segment.interval.end,
            }
            .into());
        }
    }

    let speech = detector
        .detect(samples, sample_rate)
        .context("voice-activity detection failed")?;

    let diar_segments = diarization::diarize_waveform(
        samples,
        sample_rate,
        &speech,
        extractor,
        &config.diarization,
    )?;

    if diar_segments.is_empty() {
        // Single-speaker fallback: too little signal to tell voices apart
        let name = labeling::speaker_name(0);
        for segment in &mut transcription.segments {
            segment.speaker = Some(name.clone());
        }
        transcription.speakers = 1;
    } else {
        labeling::assign_speakers(&diar_segments, &mut transcription.segments);
        smoothing::smooth(&mut transcription.segments);
        transcription.recount_speakers();
    }

    transcription.advance_to(PipelineStage::Diarized)?;
    tracing::info!(
        "diarization complete: {} segments, {} speakers",
        transcription.segments.len(),
        transcription.speakers
    );
    Ok(transcription)
}

/// Flag low-confidence segments for review.
pub fn proofread(transcription: Transcription, config: &PipelineConfig) -> Result<Transcription> {
    ensure!(
        transcription.stage == PipelineStage::Diarized,
        "proofing must run on a diarized transcription (stage is {:?})",
        transcription.stage
    );
    let mut transcription =
        proofing::add_confidence_markers(transcription, config.confidence_threshold);
    transcription.advance_to(PipelineStage::Proofed)?;
    Ok(transcription)
}

/// Cross-verify the transcription against per-speaker re-transcriptions.
///
/// The separated tracks are re-transcribed concurrently; results are
/// reassembled in track order before alignment. The temporary audio files
/// are removed on every exit path.
pub async fn verify(
    transcription: Transcription,
    samples: &[f32],
    sample_rate: u32,
    recognizer: Arc<dyn SpeechRecognizer>,
    config: &PipelineConfig,
) -> Result<Transcription> {
    ensure!(
        matches!(
            transcription.stage,
            PipelineStage::Diarized | PipelineStage::Proofed
        ),
        "verification must run on a diarized transcription (stage is {:?})",
        transcription.stage
    );
    ensure!(
        transcription.speakers > 1,
        "verification requires more than one speaker, found {}",
        transcription.speakers
    );

    let separated = separate_by_speaker(
        samples,
        sample_rate,
        &transcription.segments,
        transcription.speakers,
    )?;

    let language = transcription.language.clone();
    let secondary = futures_util::future::try_join_all(
        separated
            .tracks()
            .iter()
            .map(|track| recognizer.transcribe(&track.path, language.as_deref())),
    )
    .await
    .map_err(VerificationError::Recognizer)?;

    let mut verified = verify_against(transcription, &secondary, config.tolerance_secs);
    verified.advance_to(PipelineStage::Verified)?;
    separated.cleanup();
    Ok(verified)
}

/// Mark the transcription as handed off to the export collaborators. The
/// value is read-only from here on.
pub fn finalize_export(mut transcription: Transcription) -> Result<Transcription> {
    transcription.advance_to(PipelineStage::Exported)?;
    Ok(transcription)
}
