//! Per-speaker audio separation into temporary WAV files.
//!
//! Each speaker gets a track of the full signal length containing silence
//! everywhere except that speaker's segments. The tracks live in a scoped
//! temporary directory that is removed on every exit path; removal failures
//! are logged and never mask the primary result.

use super::VerificationError;
use crate::transcript::TranscriptSegment;
use std::path::PathBuf;
use tempfile::TempDir;

/// One separated track: a speaker name and the WAV file holding their audio.
#[derive(Debug)]
pub struct SpeakerTrack {
    pub speaker: String,
    pub path: PathBuf,
}

/// Scoped handle to the separated per-speaker audio files.
///
/// Dropping this removes the files and their parent directory. The explicit
/// [`SeparatedAudio::cleanup`] logs removal failures; the drop path swallows
/// them silently.
#[derive(Debug)]
pub struct SeparatedAudio {
    dir: TempDir,
    tracks: Vec<SpeakerTrack>,
}

impl SeparatedAudio {
    pub fn tracks(&self) -> &[SpeakerTrack] {
        &self.tracks
    }

    /// Remove the separated files now, logging (but not returning) failures.
    pub fn cleanup(self) {
        let SeparatedAudio { dir, tracks } = self;
        if let Err(e) = dir.close() {
            tracing::warn!("failed to remove separated audio files: {e}");
        } else {
            tracing::debug!("removed {} separated audio files", tracks.len());
        }
    }
}

/// Assemble one WAV per speaker from the diarized transcript segments.
///
/// Track `n` contains the original samples inside segments attributed to
/// `"Speaker n"` and silence everywhere else. Segments with an unknown
/// speaker contribute to no track.
pub fn separate_by_speaker(
    samples: &[f32],
    sample_rate: u32,
    segments: &[TranscriptSegment],
    num_speakers: usize,
) -> Result<SeparatedAudio, VerificationError> {
    let dir = tempfile::Builder::new()
        .prefix("scribe-separation-")
        .tempdir()?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut tracks = Vec::with_capacity(num_speakers);
    for n in 1..=num_speakers {
        let speaker = format!("Speaker {n}");
        let mut track = vec![0.0f32; samples.len()];
        for segment in segments {
            if segment.speaker.as_deref() != Some(speaker.as_str()) {
                continue;
            }
            let lo = ((segment.interval.start * sample_rate as f64) as usize).min(samples.len());
            let hi = ((segment.interval.end * sample_rate as f64) as usize).min(samples.len());
            track[lo..hi].copy_from_slice(&samples[lo..hi]);
        }

        let path = dir.path().join(format!("speaker_{n}.wav"));
        let mut writer = hound::WavWriter::create(&path, spec)?;
        for &sample in &track {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;

        tracing::debug!("wrote separated track for {speaker} to {}", path.display());
        tracks.push(SpeakerTrack { speaker, path });
    }

    Ok(SeparatedAudio { dir, tracks })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(start: f64, end: f64, speaker: &str) -> TranscriptSegment {
        let mut s = TranscriptSegment::new(start, end, "text");
        s.speaker = Some(speaker.to_string());
        s
    }

    fn read_track(path: &std::path::Path) -> Vec<f32> {
        hound::WavReader::open(path)
            .unwrap()
            .samples::<f32>()
            .map(|s| s.unwrap())
            .collect()
    }

    #[test]
    fn test_tracks_are_named_per_speaker() {
        let samples = vec![0.5f32; 16000];
        let segments = vec![labelled(0.0, 0.5, "Speaker 1"), labelled(0.5, 1.0, "Speaker 2")];
        let separated = separate_by_speaker(&samples, 16000, &segments, 2).unwrap();

        let names: Vec<_> = separated
            .tracks()
            .iter()
            .map(|t| t.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["speaker_1.wav", "speaker_2.wav"]);
        separated.cleanup();
    }

    #[test]
    fn test_track_contains_only_that_speakers_audio() {
        let samples = vec![0.5f32; 16000];
        let segments = vec![labelled(0.0, 0.5, "Speaker 1"), labelled(0.5, 1.0, "Speaker 2")];
        let separated = separate_by_speaker(&samples, 16000, &segments, 2).unwrap();

        let track1 = read_track(&separated.tracks()[0].path);
        assert_eq!(track1.len(), 16000);
        assert!(track1[..8000].iter().all(|&s| s == 0.5));
        assert!(track1[8000..].iter().all(|&s| s == 0.0));

        let track2 = read_track(&separated.tracks()[1].path);
        assert!(track2[..8000].iter().all(|&s| s == 0.0));
        assert!(track2[8000..].iter().all(|&s| s == 0.5));
        separated.cleanup();
    }

    #[test]
    fn test_unknown_speaker_contributes_nowhere() {
        let samples = vec![0.5f32; 8000];
        let segments = vec![labelled(0.0, 0.5, "Unknown")];
        let separated = separate_by_speaker(&samples, 16000, &segments, 1).unwrap();

        let track = read_track(&separated.tracks()[0].path);
        assert!(track.iter().all(|&s| s == 0.0));
        separated.cleanup();
    }

    #[test]
    fn test_files_are_removed_on_drop() {
        let samples = vec![0.0f32; 1600];
        let separated = separate_by_speaker(&samples, 16000, &[], 1).unwrap();
        let path = separated.tracks()[0].path.clone();
        let parent = path.parent().unwrap().to_path_buf();
        assert!(path.exists());

        drop(separated);
        assert!(!path.exists());
        assert!(!parent.exists());
    }

    #[test]
    fn test_segment_beyond_signal_end_is_clamped() {
        let samples = vec![0.5f32; 8000];
        let segments = vec![labelled(0.0, 2.0, "Speaker 1")];
        let separated = separate_by_speaker(&samples, 16000, &segments, 1).unwrap();
        let track = read_track(&separated.tracks()[0].path);
        assert_eq!(track.len(), 8000);
        assert!(track.iter().all(|&s| s == 0.5));
        separated.cleanup();
    }
}
