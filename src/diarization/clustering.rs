//! Agglomerative speaker clustering over window embeddings.
//!
//! Bottom-up merging of the closest pair of clusters under average linkage,
//! with pairwise cosine distance between embeddings. The dendrogram is cut
//! either at a fixed cluster count or at a distance threshold.

use super::config::ClusterConfig;
use super::DiarizationError;
use crate::transcript::AudioInterval;

/// A contiguous span of audio attributed to one cluster label.
///
/// Output is sorted by time and non-overlapping; downstream label mapping
/// assumes this invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct DiarizationSegment {
    pub interval: AudioInterval,
    pub label: usize,
}

/// Groups per-window embeddings into speaker clusters.
pub struct SpeakerClusterer {
    config: ClusterConfig,
}

impl SpeakerClusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Assign a zero-based cluster label to every embedding, in input order.
    ///
    /// Labels are numbered by first occurrence, so the first embedding always
    /// receives label 0. Fewer than two embeddings short-circuit to label 0
    /// without clustering.
    pub fn cluster(&self, embeddings: &[Vec<f32>]) -> Result<Vec<usize>, DiarizationError> {
        let n = embeddings.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        let dim = embeddings[0].len();
        for (index, e) in embeddings.iter().enumerate() {
            if e.len() != dim {
                return Err(DiarizationError::DimensionMismatch {
                    index,
                    expected: dim,
                    actual: e.len(),
                });
            }
        }
        if let Some(0) = self.config.num_speakers {
            return Err(DiarizationError::InvalidClusterCount);
        }
        if n < 2 {
            return Ok(vec![0; n]);
        }

        let distances = pairwise_distances(embeddings);
        let mut clusters: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

        loop {
            if clusters.len() < 2 {
                break;
            }
            let (i, j, best) = closest_pair(&clusters, &distances, n);
            match self.config.num_speakers {
                Some(k) => {
                    if clusters.len() <= k {
                        break;
                    }
                }
                None => {
                    if best > self.config.distance_threshold as f64 {
                        break;
                    }
                }
            }
            // Merge the later cluster into the earlier one; merge order is
            // fixed by the scan order in closest_pair, which keeps ties
            // deterministic.
            let merged = clusters.remove(j);
            clusters[i].extend(merged);
        }

        tracing::debug!(
            "clustered {} embeddings into {} clusters",
            n,
            clusters.len()
        );

        Ok(labels_by_first_occurrence(&clusters, n))
    }
}

/// Build labelled, non-overlapping segments from labelled overlapping
/// windows. Runs of equal labels merge into one segment; at a label change
/// the boundary is placed at the midpoint of the window overlap.
pub fn segments_from_labels(
    windows: &[AudioInterval],
    labels: &[usize],
) -> Vec<DiarizationSegment> {
    debug_assert_eq!(windows.len(), labels.len());
    let mut segments: Vec<DiarizationSegment> = Vec::new();

    for (window, &label) in windows.iter().zip(labels.iter()) {
        match segments.last_mut() {
            Some(last) if last.label == label => {
                last.interval.end = last.interval.end.max(window.end);
            }
            Some(last) if last.interval.end > window.start => {
                let boundary = (last.interval.end + window.start) / 2.0;
                last.interval.end = boundary;
                segments.push(DiarizationSegment {
                    interval: AudioInterval::new(boundary, window.end),
                    label,
                });
            }
            _ => {
                segments.push(DiarizationSegment {
                    interval: *window,
                    label,
                });
            }
        }
    }
    segments
}

/// Cosine distance with a defined maximum for degenerate vectors: a
/// zero-norm vector is at distance 1.0 from everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += *x as f64 * *y as f64;
        norm_a += *x as f64 * *x as f64;
        norm_b += *y as f64 * *y as f64;
    }
    if norm_a <= f64::EPSILON || norm_b <= f64::EPSILON {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Condensed pairwise distance matrix, indexed via `matrix_index`.
fn pairwise_distances(embeddings: &[Vec<f32>]) -> Vec<f64> {
    let n = embeddings.len();
    let mut distances = vec![0.0; n * n];
    for i in 0..n {
        for j in i + 1..n {
            let d = cosine_distance(&embeddings[i], &embeddings[j]);
            distances[i * n + j] = d;
            distances[j * n + i] = d;
        }
    }
    distances
}

/// Average linkage between two clusters: mean of all member pair distances.
fn linkage(a: &[usize], b: &[usize], distances: &[f64], n: usize) -> f64 {
    let mut sum = 0.0;
    for &i in a {
        for &j in b {
            sum += distances[i * n + j];
        }
    }
    sum / (a.len() * b.len()) as f64
}

/// First minimal pair in scan order, giving a deterministic merge order.
fn closest_pair(clusters: &[Vec<usize>], distances: &[f64], n: usize) -> (usize, usize, f64) {
    let mut best = (0, 1, f64::INFINITY);
    for i in 0..clusters.len() {
        for j in i + 1..clusters.len() {
            let d = linkage(&clusters[i], &clusters[j], distances, n);
            if d < best.2 {
                best = (i, j, d);
            }
        }
    }
    best
}

/// Number clusters 0.. in order of their earliest member index, then emit a
/// label per input index.
fn labels_by_first_occurrence(clusters: &[Vec<usize>], n: usize) -> Vec<usize> {
    let mut order: Vec<(usize, usize)> = clusters
        .iter()
        .enumerate()
        .map(|(c, members)| (*members.iter().min().expect("non-empty cluster"), c))
        .collect();
    order.sort_unstable();

    let mut labels = vec![0; n];
    for (label, &(_, c)) in order.iter().enumerate() {
        for &member in &clusters[c] {
            labels[member] = label;
        }
    }
    labels
}
