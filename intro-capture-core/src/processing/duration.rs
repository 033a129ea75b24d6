use crate::models::media::MediaFile;
use crate::traits::duration_estimator::DurationEstimator;
use crate::traits::media_codec::MediaDecoder;

/// Size-based estimate calibrated for browser-recorded WebM (~1 MiB per second).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BytesPerSecondEstimator {
    pub bytes_per_second: f64,
}

impl BytesPerSecondEstimator {
    pub fn new(bytes_per_second: f64) -> Self {
        Self { bytes_per_second }
    }
}

impl Default for BytesPerSecondEstimator {
    fn default() -> Self {
        Self::new(1024.0 * 1024.0)
    }
}

impl DurationEstimator for BytesPerSecondEstimator {
    fn estimate_secs(&self, size_bytes: u64, _mime_type: &str) -> f64 {
        size_bytes as f64 / self.bytes_per_second
    }
}

/// A duration together with how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasuredDuration {
    pub secs: f64,
    pub estimated: bool,
}

/// Read the duration from decoded metadata, falling back to `estimator`
/// (clamped to `[1, max_secs]`) when metadata is missing or non-finite.
pub fn measure_duration(
    decoder: &dyn MediaDecoder,
    estimator: &dyn DurationEstimator,
    file: &MediaFile,
    max_secs: f64,
) -> MeasuredDuration {
    match decoder.read_metadata(file) {
        Ok(metadata) if metadata.has_usable_duration() => {
            return MeasuredDuration {
                secs: metadata.duration_secs,
                estimated: false,
            };
        }
        Ok(metadata) => {
            log::debug!(
                "{} reports unusable duration {}; estimating from size",
                file.name,
                metadata.duration_secs
            );
        }
        Err(e) => {
            log::warn!("Failed to read metadata of {}: {}; estimating from size", file.name, e);
        }
    }

    let raw = estimator.estimate_secs(file.size_bytes(), &file.mime_type);
    let secs = if raw.is_finite() { raw.clamp(1.0, max_secs.max(1.0)) } else { 1.0 };
    log::info!("Using estimated duration for {}: {:.1}s", file.name, secs);
    MeasuredDuration { secs, estimated: true }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::error::ProcessingError;
    use crate::models::media::MediaMetadata;
    use crate::traits::media_codec::FrameSource;
    use approx::assert_relative_eq;

    struct FixedMetadata(Result<f64, ProcessingError>);

    impl MediaDecoder for FixedMetadata {
        fn read_metadata(&self, _file: &MediaFile) -> Result<MediaMetadata, ProcessingError> {
            self.0.clone().map(|duration_secs| MediaMetadata {
                duration_secs,
                width: 1280,
                height: 720,
                frame_rate: 30.0,
            })
        }

        fn open(&self, _file: &MediaFile) -> Result<Box<dyn FrameSource>, ProcessingError> {
            Err(ProcessingError::Decode("not needed".into()))
        }
    }

    fn file_of(size: usize) -> MediaFile {
        MediaFile::new("clip.webm", "video/webm", vec![0; size])
    }

    const MIB: usize = 1024 * 1024;

    #[test]
    fn uses_metadata_when_finite() {
        let decoder = FixedMetadata(Ok(12.5));
        let measured = measure_duration(&decoder, &BytesPerSecondEstimator::default(), &file_of(10), 60.0);
        assert_relative_eq!(measured.secs, 12.5);
        assert!(!measured.estimated);
    }

    #[test]
    fn estimates_when_duration_is_infinite() {
        let decoder = FixedMetadata(Ok(f64::INFINITY));
        let measured = measure_duration(&decoder, &BytesPerSecondEstimator::default(), &file_of(3 * MIB), 60.0);
        assert_relative_eq!(measured.secs, 3.0);
        assert!(measured.estimated);
    }

    #[test]
    fn estimate_is_clamped_to_bounds() {
        let decoder = FixedMetadata(Ok(f64::NAN));
        let estimator = BytesPerSecondEstimator::default();

        let tiny = measure_duration(&decoder, &estimator, &file_of(1000), 60.0);
        assert_relative_eq!(tiny.secs, 1.0);

        let huge = measure_duration(&decoder, &estimator, &file_of(90 * MIB), 60.0);
        assert_relative_eq!(huge.secs, 60.0);
    }

    #[test]
    fn unreadable_metadata_falls_back_to_estimate() {
        let decoder = FixedMetadata(Err(ProcessingError::Decode("corrupt header".into())));
        let measured = measure_duration(&decoder, &BytesPerSecondEstimator::new(512.0 * 1024.0), &file_of(4 * MIB), 60.0);
        assert_relative_eq!(measured.secs, 8.0);
        assert!(measured.estimated);
    }
}
