//! Tolerant time index over per-speaker transcriptions.
//!
//! Segments are bucketed by their midpoint rounded to one decimal place.
//! Lookups scan every bucket within a tolerance of the target midpoint and
//! keep entries that actually overlap the target interval. Bucketing trades
//! the O(n*m) scan for near-linear lookup; the tolerance window absorbs
//! matches whose midpoints fall just outside a bucket boundary.

use crate::transcript::{AudioInterval, Transcription};
use std::collections::BTreeMap;

/// Default lookup tolerance in seconds.
pub const DEFAULT_TOLERANCE_SECS: f64 = 2.0;

#[derive(Debug, Clone)]
struct IndexEntry {
    interval: AudioInterval,
    text: String,
    /// Position in indexing order, used to keep concatenation grouped by
    /// secondary transcription.
    seq: usize,
}

/// Midpoint-bucketed index of secondary transcription segments.
///
/// Keys are deciseconds, so `round(midpoint, 1)` maps to an exact integer
/// key. Matched texts concatenate in indexing order: secondary
/// transcriptions in the order given, their segments in order.
pub struct TimeIndex {
    buckets: BTreeMap<i64, Vec<IndexEntry>>,
}

impl TimeIndex {
    /// Index every segment across all secondary transcriptions. Segments
    /// with empty text are skipped; they can never contribute to a
    /// comparison.
    pub fn build(transcriptions: &[Transcription]) -> Self {
        let mut buckets: BTreeMap<i64, Vec<IndexEntry>> = BTreeMap::new();
        let mut seq = 0;
        for transcription in transcriptions {
            for segment in &transcription.segments {
                let text = segment.text.trim();
                if text.is_empty() {
                    continue;
                }
                let key = bucket_key(segment.interval.midpoint());
                buckets.entry(key).or_default().push(IndexEntry {
                    interval: segment.interval,
                    text: text.to_string(),
                    seq,
                });
                seq += 1;
            }
        }
        tracing::debug!(
            "time index built: {} buckets, {} entries",
            buckets.len(),
            buckets.values().map(Vec::len).sum::<usize>()
        );
        Self { buckets }
    }

    /// Retrieve the text overlapping `target`, joined by single spaces.
    ///
    /// Returns `None` when nothing overlaps; the caller leaves such segments
    /// unannotated rather than flagging them.
    pub fn lookup(&self, target: &AudioInterval, tolerance: f64) -> Option<String> {
        let mid = target.midpoint();
        let lo = bucket_key(mid - tolerance) - 1;
        let hi = bucket_key(mid + tolerance) + 1;

        let mut matches: Vec<(usize, &str)> = Vec::new();
        for (&key, entries) in self.buckets.range(lo..=hi) {
            if (key as f64 / 10.0 - mid).abs() > tolerance + 1e-9 {
                continue;
            }
            for entry in entries {
                if target.overlaps(&entry.interval) {
                    matches.push((entry.seq, &entry.text));
                }
            }
        }
        if matches.is_empty() {
            return None;
        }

        matches.sort_unstable_by_key(|&(seq, _)| seq);
        let texts: Vec<&str> = matches.iter().map(|&(_, text)| text).collect();
        Some(texts.join(" "))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

fn bucket_key(midpoint: f64) -> i64 {
    (midpoint * 10.0).round() as i64
}
