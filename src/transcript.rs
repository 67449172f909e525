//! Transcription data model shared by every pipeline stage.
//!
//! A `Transcription` is an owned value object: each stage takes it by value
//! and returns an updated copy, so no stage can alias another stage's state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Speaker label used when no diarization information exists for a segment.
pub const UNKNOWN_SPEAKER: &str = "Unknown";

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("invalid stage transition: {from:?} -> {to:?}")]
    InvalidStageTransition {
        from: PipelineStage,
        to: PipelineStage,
    },
}

/// A time span within the audio, in seconds.
///
/// Invariant: `start < end`. Constructors do not enforce this; stage entry
/// points validate it and reject malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioInterval {
    pub start: f64,
    pub end: f64,
}

impl AudioInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    /// Closed containment test, both boundaries inclusive.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    /// Open overlap test: touching boundaries do not count as overlap.
    pub fn overlaps(&self, other: &AudioInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }
}

/// Cross-verification result attached to a segment by the verify stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    /// Text retrieved from the per-speaker transcriptions. Only present when
    /// the segment was flagged for review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separated_text: Option<String>,

    /// Similarity between the primary and separated text, rounded to 2
    /// decimal places.
    pub similarity: f64,

    /// Set when the separated text agreed with the primary transcription.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub verified: bool,
}

/// One transcribed span of speech.
///
/// Created by the ASR collaborator with interval, text and confidence fields;
/// later stages fill in `speaker`, the review flags and `verification`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub id: Uuid,
    pub interval: AudioInterval,
    pub text: String,

    /// Average log probability reported by the ASR engine.
    pub confidence: f64,
    pub no_speech_prob: f64,

    /// Approximate confidence percentage, added by the proofing stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,

    #[serde(default)]
    pub needs_review: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            interval: AudioInterval::new(start, end),
            text: text.into(),
            confidence: 0.0,
            no_speech_prob: 0.0,
            confidence_score: None,
            speaker: None,
            needs_review: false,
            review_note: None,
            verification: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64, no_speech_prob: f64) -> Self {
        self.confidence = confidence;
        self.no_speech_prob = no_speech_prob;
        self
    }

    pub fn duration(&self) -> f64 {
        self.interval.duration()
    }

    /// A speaker is "known" when it is set and not the Unknown placeholder.
    pub fn known_speaker(&self) -> Option<&str> {
        match self.speaker.as_deref() {
            Some(UNKNOWN_SPEAKER) | None => None,
            Some(s) => Some(s),
        }
    }
}

/// Lifecycle of a transcription job. Transitions are one-directional and
/// each stage runs at most once per job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Raw,
    Diarized,
    Proofed,
    Verified,
    Exported,
}

impl PipelineStage {
    /// Optional stages may be skipped, but the job never moves backwards and
    /// `Exported` is terminal.
    pub fn can_advance_to(self, next: PipelineStage) -> bool {
        self != PipelineStage::Exported && next > self
    }
}

/// A full transcription with per-segment annotations and aggregate counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// Path of the source audio, as given by the caller.
    pub audio: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// End of the last segment, in seconds.
    pub duration: f64,

    pub segments: Vec<TranscriptSegment>,

    /// Number of distinct known speakers.
    pub speakers: usize,

    /// Number of segments currently flagged for review.
    pub review_needed: usize,

    pub stage: PipelineStage,

    pub created_at: DateTime<Utc>,
}

impl Transcription {
    pub fn new(
        audio: impl Into<String>,
        language: Option<String>,
        segments: Vec<TranscriptSegment>,
    ) -> Self {
        let duration = segments.last().map(|s| s.interval.end).unwrap_or(0.0);
        Self {
            audio: audio.into(),
            language,
            duration,
            segments,
            speakers: 0,
            review_needed: 0,
            stage: PipelineStage::Raw,
            created_at: Utc::now(),
        }
    }

    /// Recompute the distinct known speaker count from scratch.
    pub fn recount_speakers(&mut self) {
        let mut names: Vec<&str> = self
            .segments
            .iter()
            .filter_map(TranscriptSegment::known_speaker)
            .collect();
        names.sort_unstable();
        names.dedup();
        self.speakers = names.len();
    }

    /// Recompute the review counter from scratch.
    pub fn recount_review_needed(&mut self) {
        self.review_needed = self.segments.iter().filter(|s| s.needs_review).count();
    }

    pub fn advance_to(&mut self, next: PipelineStage) -> Result<(), TranscriptError> {
        if !self.stage.can_advance_to(next) {
            return Err(TranscriptError::InvalidStageTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        Ok(())
    }
}
