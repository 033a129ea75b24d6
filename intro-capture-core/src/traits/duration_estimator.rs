/// Strategy for guessing a video's duration when its container carries none.
///
/// Estimates are format-dependent; the pipeline clamps whatever this returns
/// to `[1, max_duration]`.
pub trait DurationEstimator: Send + Sync {
    fn estimate_secs(&self, size_bytes: u64, mime_type: &str) -> f64;
}
