//! Configuration structures for speaker diarization.

/// Configuration for the sliding analysis windows.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    /// Window length in seconds.
    pub window_secs: f64,

    /// Hop between window starts in seconds.
    pub hop_secs: f64,

    /// Minimum length for a trailing partial window. Shorter remainders are
    /// dropped.
    pub min_window_secs: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_secs: 1.5,
            hop_secs: 0.75,
            min_window_secs: 0.1,
        }
    }
}

/// Configuration for the agglomerative speaker clusterer.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Target cluster count. When `None` the dendrogram is cut at
    /// `distance_threshold` instead.
    pub num_speakers: Option<usize>,

    /// Cosine distance cut when no speaker count is given. Clusters whose
    /// average linkage stays at or below this distance are merged.
    pub distance_threshold: f32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            num_speakers: None,
            distance_threshold: 0.25,
        }
    }
}

/// Combined configuration for the diarization stage.
#[derive(Debug, Clone, Default)]
pub struct DiarizationConfig {
    pub window: WindowConfig,
    pub cluster: ClusterConfig,
}

impl DiarizationConfig {
    /// Fix the number of speakers instead of auto-detecting.
    pub fn with_num_speakers(mut self, num_speakers: usize) -> Self {
        self.cluster.num_speakers = Some(num_speakers);
        self
    }
}
