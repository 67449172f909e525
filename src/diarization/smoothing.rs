//! Noise smoothing over the assigned speaker label sequence.
//!
//! Two passes: isolated single-segment flips are folded into their
//! neighbors, then segments without a known speaker inherit one from the
//! nearest labelled neighbor. Neither pass changes segment count, order or
//! intervals.

use crate::transcript::{TranscriptSegment, UNKNOWN_SPEAKER};

/// Flips shorter than this are treated as clustering noise.
const MAX_FLIP_SECS: f64 = 3.0;

/// Run both smoothing rules in order.
pub fn smooth(segments: &mut [TranscriptSegment]) {
    suppress_isolated_flips(segments);
    fill_speaker_gaps(segments);
}

/// Rule 1: a short segment whose neighbors agree on a different speaker is
/// reassigned to that speaker. Single forward sweep; positions already
/// visited are not re-evaluated after a reassignment.
pub fn suppress_isolated_flips(segments: &mut [TranscriptSegment]) {
    if segments.len() < 3 {
        return;
    }
    for i in 1..segments.len() - 1 {
        let prev = segments[i - 1].speaker.clone();
        if prev.is_none() {
            continue;
        }
        if segments[i + 1].speaker == prev
            && segments[i].speaker != prev
            && segments[i].duration() < MAX_FLIP_SECS
        {
            tracing::debug!(
                "smoothing isolated flip at segment {} ({:?} -> {:?})",
                i,
                segments[i].speaker,
                prev
            );
            segments[i].speaker = prev;
        }
    }
}

/// Rule 2: segments with no known speaker inherit the nearest known label,
/// preferring the backward neighbor and falling back to the forward one.
pub fn fill_speaker_gaps(segments: &mut [TranscriptSegment]) {
    for i in 0..segments.len() {
        if segments[i].known_speaker().is_some() {
            continue;
        }
        let backward = segments[..i]
            .iter()
            .rev()
            .find_map(|s| s.known_speaker().map(str::to_string));
        let replacement = backward.or_else(|| {
            segments[i + 1..]
                .iter()
                .find_map(|s| s.known_speaker().map(str::to_string))
        });
        if let Some(speaker) = replacement {
            segments[i].speaker = Some(speaker);
        }
    }
}
