//! Cross-verification of a transcription against per-speaker
//! re-transcriptions.
//!
//! The aligner retrieves the secondary text overlapping each primary
//! segment; the scorer compares the two and flags discrepancies. Segments
//! with no overlapping secondary text are left unannotated.

pub mod aligner;
pub mod scorer;
pub mod separation;

pub use aligner::{TimeIndex, DEFAULT_TOLERANCE_SECS};
pub use scorer::{review_note, score_segment, similarity, REVIEW_THRESHOLD};
pub use separation::{separate_by_speaker, SeparatedAudio, SpeakerTrack};

use crate::transcript::Transcription;
use thiserror::Error;

/// Errors that can occur during the verification stage.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("failed to write separated audio: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode separated audio: {0}")]
    Wav(#[from] hound::Error),

    #[error("re-transcription failed")]
    Recognizer(#[from] anyhow::Error),
}

/// Compare a transcription against independently produced per-speaker
/// transcriptions, annotating each segment that has overlapping secondary
/// text. Recomputes the `review_needed` aggregate afterwards.
pub fn verify_against(
    mut transcription: Transcription,
    secondary: &[Transcription],
    tolerance: f64,
) -> Transcription {
    let index = TimeIndex::build(secondary);

    let mut compared = 0usize;
    for segment in &mut transcription.segments {
        if let Some(separated_text) = index.lookup(&segment.interval, tolerance) {
            score_segment(segment, separated_text);
            compared += 1;
        }
    }
    transcription.recount_review_needed();

    tracing::info!(
        "verification compared {}/{} segments, {} flagged for review",
        compared,
        transcription.segments.len(),
        transcription.review_needed
    );
    transcription
}
