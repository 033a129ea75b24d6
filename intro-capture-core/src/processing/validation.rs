use std::sync::Arc;

use crate::models::config::ValidationLimits;
use crate::models::error::ValidationError;
use crate::models::media::{base_mime_type, AssetSource, MediaFile};
use crate::processing::duration::{measure_duration, MeasuredDuration};
use crate::traits::duration_estimator::DurationEstimator;
use crate::traits::media_codec::MediaDecoder;

/// Outcome of validating one candidate file.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub reason: Option<ValidationError>,
    /// Set once the duration check was reached.
    pub duration: Option<MeasuredDuration>,
}

impl ValidationResult {
    fn passed(duration: MeasuredDuration) -> Self {
        Self {
            valid: true,
            reason: None,
            duration: Some(duration),
        }
    }

    fn failed(reason: ValidationError, duration: Option<MeasuredDuration>) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            duration,
        }
    }

    /// Human-readable reason for a failed validation.
    pub fn reason_message(&self) -> Option<String> {
        self.reason.as_ref().map(|r| r.to_string())
    }

    pub fn into_result(self) -> Result<MeasuredDuration, ValidationError> {
        match (self.reason, self.duration) {
            (Some(reason), _) => Err(reason),
            (None, Some(duration)) => Ok(duration),
            (None, None) => Err(ValidationError::Empty),
        }
    }
}

/// Enforces size, format and duration constraints on a candidate file.
pub struct ValidationPipeline {
    limits: ValidationLimits,
    decoder: Arc<dyn MediaDecoder>,
    estimator: Arc<dyn DurationEstimator>,
}

impl ValidationPipeline {
    pub fn new(
        limits: ValidationLimits,
        decoder: Arc<dyn MediaDecoder>,
        estimator: Arc<dyn DurationEstimator>,
    ) -> Self {
        Self {
            limits,
            decoder,
            estimator,
        }
    }

    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    pub fn check_size(&self, file: &MediaFile) -> Result<(), ValidationError> {
        let size_bytes = file.size_bytes();
        if size_bytes > self.limits.max_size_bytes {
            return Err(ValidationError::TooLarge {
                size_bytes,
                max_bytes: self.limits.max_size_bytes,
            });
        }
        if size_bytes == 0 {
            return Err(ValidationError::Empty);
        }
        Ok(())
    }

    pub fn check_format(&self, file: &MediaFile) -> Result<(), ValidationError> {
        let base = file.base_mime_type();
        let accepted = self
            .limits
            .accepted_mime_types
            .iter()
            .any(|m| base_mime_type(m) == base);
        if accepted {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedFormat {
                mime_type: file.mime_type.clone(),
            })
        }
    }

    /// Uploads must meet the minimum strictly. Recordings may be short: the
    /// recorder's countdown already bounds the session.
    pub fn check_duration(&self, duration_secs: f64, source: AssetSource) -> Result<(), ValidationError> {
        if duration_secs > self.limits.max_duration_secs {
            return Err(ValidationError::TooLong {
                duration_secs,
                max_secs: self.limits.max_duration_secs,
            });
        }
        if duration_secs < self.limits.min_duration_secs {
            match source {
                AssetSource::Uploaded => {
                    return Err(ValidationError::TooShort {
                        duration_secs,
                        min_secs: self.limits.min_duration_secs,
                    });
                }
                AssetSource::Recorded => {
                    log::info!(
                        "Recorded video is {:.1}s (< {}s minimum); allowing it to proceed",
                        duration_secs,
                        self.limits.min_duration_secs
                    );
                }
            }
        }
        Ok(())
    }

    /// Run the checks in order, stopping at the first failure.
    pub fn validate(&self, file: &MediaFile, source: AssetSource) -> ValidationResult {
        if let Err(reason) = self.check_size(file).and_then(|_| self.check_format(file)) {
            log::warn!("Rejected {} ({}): {}", file.name, source, reason);
            return ValidationResult::failed(reason, None);
        }

        let duration = self.measure(file);
        match self.check_duration(duration.secs, source) {
            Ok(()) => ValidationResult::passed(duration),
            Err(reason) => {
                log::warn!("Rejected {} ({}): {}", file.name, source, reason);
                ValidationResult::failed(reason, Some(duration))
            }
        }
    }

    pub fn measure(&self, file: &MediaFile) -> MeasuredDuration {
        measure_duration(
            self.decoder.as_ref(),
            self.estimator.as_ref(),
            file,
            self.limits.max_duration_secs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::error::ProcessingError;
    use crate::models::media::MediaMetadata;
    use crate::processing::duration::BytesPerSecondEstimator;
    use crate::traits::media_codec::FrameSource;

    const MIB: usize = 1024 * 1024;

    /// Reports the same duration for every file.
    struct FixedDuration(f64);

    impl MediaDecoder for FixedDuration {
        fn read_metadata(&self, _file: &MediaFile) -> Result<MediaMetadata, ProcessingError> {
            Ok(MediaMetadata {
                duration_secs: self.0,
                width: 640,
                height: 360,
                frame_rate: 30.0,
            })
        }

        fn open(&self, _file: &MediaFile) -> Result<Box<dyn FrameSource>, ProcessingError> {
            Err(ProcessingError::Decode("not needed".into()))
        }
    }

    fn pipeline(duration: f64) -> ValidationPipeline {
        ValidationPipeline::new(
            ValidationLimits::default(),
            Arc::new(FixedDuration(duration)),
            Arc::new(BytesPerSecondEstimator::default()),
        )
    }

    fn file(mime: &str, size: usize) -> MediaFile {
        MediaFile::new("candidate", mime, vec![7; size])
    }

    #[test]
    fn accepts_file_within_bounds() {
        let result = pipeline(15.0).validate(&file("video/webm;codecs=vp9", 8 * MIB), AssetSource::Recorded);
        assert!(result.valid);
        assert_eq!(result.reason, None);
        assert_eq!(result.duration.map(|d| d.secs), Some(15.0));
    }

    #[test]
    fn oversize_reports_size_regardless_of_format_or_duration() {
        for (mime, duration) in [("video/mp4", 30.0), ("application/pdf", 30.0), ("video/webm", 500.0)] {
            let result = pipeline(duration).validate(&file(mime, 50 * MIB + 1), AssetSource::Uploaded);
            assert!(!result.valid);
            assert!(
                matches!(result.reason, Some(ValidationError::TooLarge { .. })),
                "{} / {}s gave {:?}",
                mime,
                duration,
                result.reason
            );
        }
    }

    #[test]
    fn rejects_unaccepted_format() {
        let result = pipeline(20.0).validate(&file("video/x-matroska", MIB), AssetSource::Uploaded);
        assert!(!result.valid);
        assert!(result.reason_message().unwrap().contains("not supported"));
        assert_eq!(result.duration, None);
    }

    #[test]
    fn rejects_empty_file() {
        let result = pipeline(20.0).validate(&file("video/mp4", 0), AssetSource::Uploaded);
        assert_eq!(result.reason, Some(ValidationError::Empty));
    }

    #[test]
    fn short_upload_fails_but_short_recording_passes() {
        let short = file("video/webm", 2 * MIB);

        let uploaded = pipeline(5.0).validate(&short, AssetSource::Uploaded);
        assert!(matches!(uploaded.reason, Some(ValidationError::TooShort { .. })));

        let recorded = pipeline(5.0).validate(&short, AssetSource::Recorded);
        assert!(recorded.valid);
    }

    #[test]
    fn too_long_fails_for_both_sources() {
        for source in [AssetSource::Uploaded, AssetSource::Recorded] {
            let result = pipeline(61.0).validate(&file("video/mp4", MIB), source);
            assert!(matches!(result.reason, Some(ValidationError::TooLong { .. })));
        }
    }

    #[test]
    fn non_finite_duration_is_estimated_not_rejected() {
        let result = pipeline(f64::INFINITY).validate(&file("video/webm", 12 * MIB), AssetSource::Uploaded);
        assert!(result.valid);
        let duration = result.duration.unwrap();
        assert!(duration.estimated);
        assert_eq!(duration.secs, 12.0);
    }
}
