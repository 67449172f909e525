//! Sliding-window segmentation for embedding extraction.
//!
//! Windows cover the entire signal span at a fixed stride, independent of
//! gaps between detected speech intervals; speech detection only gates
//! whether an embedding is extracted for a window later.

use super::config::WindowConfig;
use crate::transcript::AudioInterval;

/// Tolerance for float comparisons on window boundaries.
const BOUNDARY_EPS: f64 = 1e-9;

/// One analysis window: its time span plus the raw samples it covers.
pub struct AnalysisWindow<'a> {
    pub interval: AudioInterval,
    pub samples: &'a [f32],
}

impl<'a> AnalysisWindow<'a> {
    /// True when the window intersects any detected speech interval.
    pub fn overlaps_speech(&self, speech: &[AudioInterval]) -> bool {
        speech.iter().any(|s| self.interval.overlaps(s))
    }
}

/// Slices a waveform into fixed-length overlapping analysis windows.
pub struct WindowSegmenter {
    config: WindowConfig,
}

impl WindowSegmenter {
    pub fn new(config: WindowConfig) -> Self {
        Self { config }
    }

    /// Produce the ordered window sequence for a signal.
    ///
    /// A trailing partial window shorter than the full window length is kept
    /// only when it reaches the minimum viable length. A signal shorter than
    /// the minimum length yields no windows at all; the caller applies the
    /// single-speaker fallback in that case.
    pub fn segment<'a>(&self, samples: &'a [f32], sample_rate: u32) -> Vec<AnalysisWindow<'a>> {
        let total = samples.len() as f64 / sample_rate as f64;
        if total < self.config.min_window_secs {
            return Vec::new();
        }

        let mut windows = Vec::new();
        let mut start = 0.0;
        loop {
            let end = start + self.config.window_secs;
            if end <= total + BOUNDARY_EPS {
                windows.push(self.window_at(samples, sample_rate, start, end.min(total)));
                start += self.config.hop_secs;
                if start + BOUNDARY_EPS >= total {
                    break;
                }
            } else {
                // Trailing partial window
                if total - start >= self.config.min_window_secs {
                    windows.push(self.window_at(samples, sample_rate, start, total));
                }
                break;
            }
        }
        windows
    }

    fn window_at<'a>(
        &self,
        samples: &'a [f32],
        sample_rate: u32,
        start: f64,
        end: f64,
    ) -> AnalysisWindow<'a> {
        let lo = (start * sample_rate as f64).round() as usize;
        let hi = ((end * sample_rate as f64).round() as usize).min(samples.len());
        AnalysisWindow {
            interval: AudioInterval::new(start, end),
            samples: &samples[lo.min(hi)..hi],
        }
    }
}
