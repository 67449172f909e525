//! Speaker attribution and transcription cross-verification.
//!
//! Takes a raw ASR transcription plus the decoded waveform and runs it
//! through a staged pipeline: diarization attaches a speaker to every
//! segment, proofing flags low-confidence text, and verification
//! re-transcribes per-speaker audio to cross-check the primary text.
//! The external ML models (voice-activity detection, speaker embeddings,
//! speech recognition) sit behind the traits in [`providers`].

pub mod diarization;
pub mod pipeline;
pub mod proofing;
pub mod providers;
pub mod transcript;
pub mod verification;

pub use pipeline::{diarize, finalize_export, proofread, verify, PipelineConfig};
pub use transcript::{
    AudioInterval, PipelineStage, TranscriptSegment, Transcription, UNKNOWN_SPEAKER,
};

#[cfg(test)]
mod pipeline_tests;
