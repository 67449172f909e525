//! Midpoint attribution of cluster labels to transcript segments.

use super::clustering::DiarizationSegment;
use crate::transcript::{TranscriptSegment, UNKNOWN_SPEAKER};

/// Render a zero-based cluster label as the human-facing speaker name.
pub fn speaker_name(label: usize) -> String {
    format!("Speaker {}", label + 1)
}

/// Assign a speaker to every transcript segment.
///
/// The first diarization segment containing the transcript midpoint wins;
/// this relies on the diarization list being sorted and non-overlapping.
/// When no segment contains the midpoint, the segment with the nearest
/// boundary is used instead. An empty diarization list assigns `"Unknown"`
/// everywhere; that is the only way `"Unknown"` is produced here.
pub fn assign_speakers(diarization: &[DiarizationSegment], segments: &mut [TranscriptSegment]) {
    for segment in segments.iter_mut() {
        let mid = segment.interval.midpoint();
        segment.speaker = Some(match label_at(diarization, mid) {
            Some(label) => speaker_name(label),
            None => UNKNOWN_SPEAKER.to_string(),
        });
    }
}

fn label_at(diarization: &[DiarizationSegment], mid: f64) -> Option<usize> {
    for d in diarization {
        if d.interval.contains(mid) {
            return Some(d.label);
        }
    }

    // No containing segment: fall back to the nearest boundary.
    diarization
        .iter()
        .min_by(|a, b| {
            boundary_distance(a, mid)
                .partial_cmp(&boundary_distance(b, mid))
                .expect("boundary distances are finite")
        })
        .map(|d| d.label)
}

fn boundary_distance(segment: &DiarizationSegment, mid: f64) -> f64 {
    let to_start = (segment.interval.start - mid).abs();
    let to_end = (segment.interval.end - mid).abs();
    to_start.min(to_end)
}
