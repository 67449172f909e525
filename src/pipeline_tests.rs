//! End-to-end tests driving the full pipeline with mock model providers.

use crate::diarization::DiarizationConfig;
use crate::pipeline::{diarize, finalize_export, proofread, verify, PipelineConfig};
use crate::providers::{EmbeddingExtractor, SpeechDetector, SpeechRecognizer};
use crate::transcript::{AudioInterval, PipelineStage, TranscriptSegment, Transcription};
use crate::verification::VerificationError;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Once};

/// Route stage logs to the test output; RUST_LOG controls verbosity.
fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Detector that reports a fixed set of speech spans.
struct FixedDetector(Vec<AudioInterval>);

impl SpeechDetector for FixedDetector {
    fn detect(&self, _samples: &[f32], _sample_rate: u32) -> Result<Vec<AudioInterval>> {
        Ok(self.0.clone())
    }
}

/// Extractor that derives the "voice" from the signal amplitude: quiet
/// windows embed on one axis, loud windows on an orthogonal one.
struct AmplitudeExtractor;

impl EmbeddingExtractor for AmplitudeExtractor {
    fn embed(&self, window: &[f32], _sample_rate: u32) -> Result<Vec<f32>> {
        let mean = window.iter().sum::<f32>() / window.len().max(1) as f32;
        let mut v = vec![0.0; 8];
        if mean < 0.5 {
            v[0] = 1.0;
        } else {
            v[4] = 1.0;
        }
        Ok(v)
    }
}

/// Recognizer that answers per separated track, keyed by file name.
struct TrackRecognizer;

#[async_trait]
impl SpeechRecognizer for TrackRecognizer {
    async fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<Transcription> {
        let name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let segments = match name {
            "speaker_1.wav" => vec![TranscriptSegment::new(0.1, 1.9, "hola como estas")],
            "speaker_2.wav" => vec![TranscriptSegment::new(2.1, 3.9, "te veo el jueves")],
            other => anyhow::bail!("unexpected track {other}"),
        };
        Ok(Transcription::new(
            name,
            language.map(str::to_string),
            segments,
        ))
    }
}

/// Recognizer that always fails, for error-path coverage.
struct FailingRecognizer;

#[async_trait]
impl SpeechRecognizer for FailingRecognizer {
    async fn transcribe(&self, _audio: &Path, _language: Option<&str>) -> Result<Transcription> {
        anyhow::bail!("engine unavailable")
    }
}

fn raw(spans: &[(f64, f64, &str)]) -> Transcription {
    Transcription::new(
        "audio.wav",
        Some("es".to_string()),
        spans
            .iter()
            .map(|&(start, end, text)| TranscriptSegment::new(start, end, text))
            .collect(),
    )
}

/// 6 seconds of audio: the first 3s at low amplitude, the rest loud.
fn two_voice_samples(sample_rate: u32) -> Vec<f32> {
    let mut samples = vec![0.1f32; sample_rate as usize * 6];
    for s in samples.iter_mut().skip(3 * sample_rate as usize) {
        *s = 0.9;
    }
    samples
}

fn two_speaker_config() -> PipelineConfig {
    PipelineConfig {
        diarization: DiarizationConfig::default().with_num_speakers(2),
        ..PipelineConfig::default()
    }
}

#[test]
fn test_diarize_end_to_end_two_speakers() {
    init_tracing();
    let sample_rate = 16000;
    let samples = two_voice_samples(sample_rate);
    let transcription = raw(&[
        (0.0, 2.0, "hola como estas"),
        (2.0, 3.0, "bien gracias"),
        (3.0, 6.0, "te veo el martes"),
    ]);

    let result = diarize(
        transcription,
        &samples,
        sample_rate,
        &FixedDetector(vec![AudioInterval::new(0.0, 6.0)]),
        &AmplitudeExtractor,
        &two_speaker_config(),
    )
    .unwrap();

    assert_eq!(result.stage, PipelineStage::Diarized);
    assert_eq!(result.speakers, 2);
    let speakers: Vec<_> = result
        .segments
        .iter()
        .map(|s| s.speaker.as_deref().unwrap())
        .collect();
    assert_eq!(speakers, vec!["Speaker 1", "Speaker 1", "Speaker 2"]);
}

#[test]
fn test_diarize_falls_back_to_single_speaker() {
    let sample_rate = 16000;
    let samples = vec![0.0f32; sample_rate as usize * 4];
    let transcription = raw(&[(0.0, 2.0, "uno"), (2.0, 4.0, "dos")]);

    // No detected speech, so no embeddings are produced
    let result = diarize(
        transcription,
        &samples,
        sample_rate,
        &FixedDetector(vec![]),
        &AmplitudeExtractor,
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(result.stage, PipelineStage::Diarized);
    assert_eq!(result.speakers, 1);
    assert!(result
        .segments
        .iter()
        .all(|s| s.speaker.as_deref() == Some("Speaker 1")));
}

#[test]
fn test_diarize_rejects_malformed_intervals() {
    let sample_rate = 16000;
    let samples = vec![0.0f32; sample_rate as usize];
    let transcription = raw(&[(2.0, 1.0, "backwards")]);

    let err = diarize(
        transcription,
        &samples,
        sample_rate,
        &FixedDetector(vec![]),
        &AmplitudeExtractor,
        &PipelineConfig::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("malformed interval"));
}

#[test]
fn test_diarize_runs_only_on_raw_transcriptions() {
    let sample_rate = 16000;
    let samples = vec![0.0f32; sample_rate as usize];
    let mut transcription = raw(&[(0.0, 1.0, "hola")]);
    transcription.advance_to(PipelineStage::Diarized).unwrap();

    let err = diarize(
        transcription,
        &samples,
        sample_rate,
        &FixedDetector(vec![]),
        &AmplitudeExtractor,
        &PipelineConfig::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("raw transcription"));
}

#[test]
fn test_proofread_runs_after_diarization() {
    let transcription = raw(&[(0.0, 1.0, "hola")]);
    assert!(proofread(transcription, &PipelineConfig::default()).is_err());

    let mut diarized = raw(&[(0.0, 1.0, "hola")]);
    diarized.segments[0] = diarized.segments[0].clone().with_confidence(-1.2, 0.0);
    diarized.advance_to(PipelineStage::Diarized).unwrap();

    let result = proofread(diarized, &PipelineConfig::default()).unwrap();
    assert_eq!(result.stage, PipelineStage::Proofed);
    assert!(result.segments[0].needs_review);
    assert_eq!(result.review_needed, 1);
}

/// Builds a diarized two-speaker transcription over 4 seconds of audio.
fn diarized_two_speakers() -> Transcription {
    let mut t = raw(&[(0.0, 2.0, "hola como estas"), (2.0, 4.0, "te veo el martes")]);
    t.segments[0].speaker = Some("Speaker 1".to_string());
    t.segments[1].speaker = Some("Speaker 2".to_string());
    t.recount_speakers();
    t.advance_to(PipelineStage::Diarized).unwrap();
    t
}

#[tokio::test]
async fn test_verify_end_to_end() {
    init_tracing();
    let sample_rate = 16000;
    let samples = vec![0.5f32; sample_rate as usize * 4];

    let result = verify(
        diarized_two_speakers(),
        &samples,
        sample_rate,
        Arc::new(TrackRecognizer),
        &PipelineConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.stage, PipelineStage::Verified);

    let first = &result.segments[0];
    assert!(!first.needs_review);
    assert_eq!(first.verification.as_ref().unwrap().similarity, 1.0);

    let second = &result.segments[1];
    assert!(second.needs_review);
    let note = second.review_note.as_deref().unwrap();
    assert!(note.contains("martes") && note.contains("jueves"));
    assert_eq!(
        second
            .verification
            .as_ref()
            .unwrap()
            .separated_text
            .as_deref(),
        Some("te veo el jueves")
    );
    assert_eq!(result.review_needed, 1);
}

#[tokio::test]
async fn test_verify_surfaces_recognition_failures() {
    let sample_rate = 16000;
    let samples = vec![0.5f32; sample_rate as usize * 4];

    let err = verify(
        diarized_two_speakers(),
        &samples,
        sample_rate,
        Arc::new(FailingRecognizer),
        &PipelineConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("re-transcription failed"));
    assert!(matches!(
        err.downcast_ref::<VerificationError>(),
        Some(VerificationError::Recognizer(_))
    ));
}

#[tokio::test]
async fn test_verify_requires_multiple_speakers() {
    let sample_rate = 16000;
    let samples = vec![0.5f32; sample_rate as usize];
    let mut t = raw(&[(0.0, 1.0, "hola")]);
    t.segments[0].speaker = Some("Speaker 1".to_string());
    t.recount_speakers();
    t.advance_to(PipelineStage::Diarized).unwrap();

    let err = verify(
        t,
        &samples,
        sample_rate,
        Arc::new(TrackRecognizer),
        &PipelineConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("more than one speaker"));
}

#[tokio::test]
async fn test_verify_requires_a_diarized_transcription() {
    let sample_rate = 16000;
    let samples = vec![0.5f32; sample_rate as usize];

    let err = verify(
        raw(&[(0.0, 1.0, "hola")]),
        &samples,
        sample_rate,
        Arc::new(TrackRecognizer),
        &PipelineConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("diarized transcription"));
}

#[test]
fn test_finalize_export_is_terminal() {
    let mut t = raw(&[(0.0, 1.0, "hola")]);
    t.advance_to(PipelineStage::Diarized).unwrap();

    let exported = finalize_export(t).unwrap();
    assert_eq!(exported.stage, PipelineStage::Exported);
    assert!(finalize_export(exported).is_err());
}
