//! Text similarity scoring and discrepancy notes.
//!
//! Similarity is the longest-matching-blocks ratio over characters; the
//! review note comes from the same alignment run at word granularity, using
//! only the first non-trivial edit operation.

use crate::transcript::{TranscriptSegment, Verification};
use std::collections::HashMap;
use std::hash::Hash;

/// Segments scoring below this similarity are flagged for review.
pub const REVIEW_THRESHOLD: f64 = 0.85;

/// Similarity in `[0, 1]` between two texts, lowercased and trimmed first.
/// Either side empty (after trimming) scores 0.0: an absent text is never a
/// meaningful match for a real one.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let matched: usize = matching_blocks(&a, &b).iter().map(|m| m.size).sum();
    2.0 * matched as f64 / (a.len() + b.len()) as f64
}

/// Score a primary segment against the text retrieved from the per-speaker
/// transcriptions, attaching the verification outcome in place.
pub fn score_segment(segment: &mut TranscriptSegment, separated_text: String) {
    let score = similarity(&segment.text, &separated_text);
    let rounded = (score * 100.0).round() / 100.0;

    if score < REVIEW_THRESHOLD {
        segment.needs_review = true;
        segment.review_note = Some(review_note(&segment.text, &separated_text));
        segment.verification = Some(Verification {
            separated_text: Some(separated_text),
            similarity: rounded,
            verified: false,
        });
    } else {
        segment.verification = Some(Verification {
            separated_text: None,
            similarity: rounded,
            verified: true,
        });
    }
}

/// Build a short note describing the first word-level discrepancy.
pub fn review_note(primary: &str, separated: &str) -> String {
    let primary = primary.to_lowercase();
    let separated = separated.to_lowercase();
    let a: Vec<&str> = primary.split_whitespace().collect();
    let b: Vec<&str> = separated.split_whitespace().collect();

    for op in opcodes(&a, &b) {
        match op {
            EditOp::Equal { .. } => continue,
            EditOp::Replace { a_range, b_range } => {
                return truncate_chars(&format!("Check: {}/{}", a[a_range.start], b[b_range.start]), 30);
            }
            EditOp::Delete { a_range } => {
                return truncate_chars(&format!("Missing: {}", a[a_range.start]), 20);
            }
            EditOp::Insert { b_range } => {
                return truncate_chars(&format!("Extra: {}", b[b_range.start]), 20);
            }
        }
    }
    // Below-threshold similarity but no word-level edit found
    "Check audio".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Equal {
        a_range: std::ops::Range<usize>,
        b_range: std::ops::Range<usize>,
    },
    Replace {
        a_range: std::ops::Range<usize>,
        b_range: std::ops::Range<usize>,
    },
    Delete {
        a_range: std::ops::Range<usize>,
    },
    Insert {
        b_range: std::ops::Range<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Match {
    a: usize,
    b: usize,
    size: usize,
}

/// Longest matching block between `a[a_lo..a_hi]` and `b[b_lo..b_hi]`,
/// preferring the earliest position in `a`, then in `b`.
fn longest_match<T: Eq + Hash>(
    a: &[T],
    b: &[T],
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> Match {
    let mut positions: HashMap<&T, Vec<usize>> = HashMap::new();
    for j in b_lo..b_hi {
        positions.entry(&b[j]).or_default().push(j);
    }

    let mut best = Match {
        a: a_lo,
        b: b_lo,
        size: 0,
    };
    // run_lengths[j] = length of the match ending at (i-1, j-1)
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();
    for i in a_lo..a_hi {
        let mut next_runs: HashMap<usize, usize> = HashMap::new();
        if let Some(js) = positions.get(&a[i]) {
            for &j in js {
                let len = if j > 0 {
                    run_lengths.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                next_runs.insert(j, len);
                if len > best.size {
                    best = Match {
                        a: i + 1 - len,
                        b: j + 1 - len,
                        size: len,
                    };
                }
            }
        }
        run_lengths = next_runs;
    }
    best
}

/// All matching blocks in ascending order, found by recursive subdivision
/// around the longest match.
fn matching_blocks<T: Eq + Hash>(a: &[T], b: &[T]) -> Vec<Match> {
    let mut blocks = Vec::new();
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((a_lo, a_hi, b_lo, b_hi)) = queue.pop() {
        let m = longest_match(a, b, a_lo, a_hi, b_lo, b_hi);
        if m.size == 0 {
            continue;
        }
        blocks.push(m);
        queue.push((a_lo, m.a, b_lo, m.b));
        queue.push((m.a + m.size, a_hi, m.b + m.size, b_hi));
    }
    blocks.sort_unstable_by_key(|m| (m.a, m.b));
    blocks
}

/// Translate matching blocks into edit operations over both sequences.
fn opcodes<T: Eq + Hash>(a: &[T], b: &[T]) -> Vec<EditOp> {
    let blocks = matching_blocks(a, b);
    let mut ops = Vec::new();
    let (mut i, mut j) = (0, 0);

    for m in blocks.iter().chain(std::iter::once(&Match {
        a: a.len(),
        b: b.len(),
        size: 0,
    })) {
        if i < m.a && j < m.b {
            ops.push(EditOp::Replace {
                a_range: i..m.a,
                b_range: j..m.b,
            });
        } else if i < m.a {
            ops.push(EditOp::Delete { a_range: i..m.a });
        } else if j < m.b {
            ops.push(EditOp::Insert { b_range: j..m.b });
        }
        if m.size > 0 {
            ops.push(EditOp::Equal {
                a_range: m.a..m.a + m.size,
                b_range: m.b..m.b + m.size,
            });
        }
        i = m.a + m.size;
        j = m.b + m.size;
    }
    ops
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
