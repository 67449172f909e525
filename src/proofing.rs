//! Confidence analysis of transcribed segments.
//!
//! Whisper-style engines report average log probabilities: closer to zero
//! is more confident. Segments below the threshold, or likely to be
//! non-speech, are flagged for review.

use crate::transcript::Transcription;

/// Log-probability threshold below which a segment needs review.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = -0.5;

/// Probability above which a segment is treated as probable non-speech.
const NO_SPEECH_THRESHOLD: f64 = 0.5;

/// Annotate every segment with an approximate confidence percentage and a
/// review flag, then recompute the review counter.
pub fn add_confidence_markers(mut transcription: Transcription, threshold: f64) -> Transcription {
    for segment in &mut transcription.segments {
        // exp(-0.1) ~ 0.90, exp(-0.5) ~ 0.61, exp(-1.0) ~ 0.37
        let confidence_pct = if segment.confidence < 0.0 {
            segment.confidence.exp()
        } else {
            0.95
        };
        let confidence_pct = confidence_pct * (1.0 - segment.no_speech_prob);

        segment.confidence_score = Some((confidence_pct * 100.0).round() / 100.0);
        segment.needs_review =
            segment.confidence < threshold || segment.no_speech_prob > NO_SPEECH_THRESHOLD;
    }
    transcription.recount_review_needed();

    tracing::debug!(
        "confidence analysis flagged {}/{} segments",
        transcription.review_needed,
        transcription.segments.len()
    );
    transcription
}
