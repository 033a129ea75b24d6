use std::convert::Infallible;
use std::sync::Arc;

use crate::models::config::CaptureConfiguration;
use crate::models::error::{ProcessingError, ValidationError};
use crate::models::media::{AssetSource, MediaAsset, MediaFile, Thumbnail};
use crate::processing::cancel::CancellationToken;
use crate::processing::compression::CompressionEngine;
use crate::processing::duration::{BytesPerSecondEstimator, MeasuredDuration};
use crate::processing::thumbnail::ThumbnailExtractor;
use crate::processing::validation::ValidationPipeline;
use crate::traits::duration_estimator::DurationEstimator;
use crate::traits::media_codec::{EncoderFactory, MediaDecoder};

/// Result of one pipeline stage.
///
/// Validation is the only stage that can be fatal. Thumbnail and compression
/// failures degrade to a lesser value and carry the reason along; those stages
/// are typed with `F = Infallible`.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T, F = ValidationError> {
    Ok(T),
    Degraded(T, ProcessingError),
    Fatal(F),
}

impl<T, F> StageOutcome<T, F> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, StageOutcome::Degraded(..))
    }

    /// Split into the usable value and the degradation reason, if any.
    pub fn into_parts(self) -> Result<(T, Option<ProcessingError>), F> {
        match self {
            StageOutcome::Ok(value) => Ok((value, None)),
            StageOutcome::Degraded(value, reason) => Ok((value, Some(reason))),
            StageOutcome::Fatal(reason) => Err(reason),
        }
    }
}

impl<T> StageOutcome<T, Infallible> {
    pub fn settle(self) -> (T, Option<ProcessingError>) {
        match self {
            StageOutcome::Ok(value) => (value, None),
            StageOutcome::Degraded(value, reason) => (value, Some(reason)),
            StageOutcome::Fatal(never) => match never {},
        }
    }
}

/// A processed asset plus the non-fatal failures met on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedMedia {
    pub asset: MediaAsset,
    pub degradations: Vec<ProcessingError>,
}

impl ProcessedMedia {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// The file that leaves the compression stage.
struct Deliverable {
    file: MediaFile,
    duration_secs: f64,
    compressed: bool,
}

/// Validation → thumbnail → (conditional) compression.
///
/// ```text
/// [raw file] → [ValidationPipeline] ──fatal──→ Err(ValidationError)
///                    │ duration
///                    ├→ [ThumbnailExtractor] ──fail──→ no thumbnail
///                    └→ [CompressionEngine]  ──fail──→ original file
///                              ↓
///                         [MediaAsset]
/// ```
pub struct MediaPipeline {
    validation: ValidationPipeline,
    thumbnails: ThumbnailExtractor,
    compression: CompressionEngine,
}

impl MediaPipeline {
    pub fn new(
        config: &CaptureConfiguration,
        decoder: Arc<dyn MediaDecoder>,
        encoders: Arc<dyn EncoderFactory>,
    ) -> Self {
        let estimator = Arc::new(BytesPerSecondEstimator::new(config.estimate_bytes_per_second));
        Self::with_estimator(config, decoder, encoders, estimator)
    }

    pub fn with_estimator(
        config: &CaptureConfiguration,
        decoder: Arc<dyn MediaDecoder>,
        encoders: Arc<dyn EncoderFactory>,
        estimator: Arc<dyn DurationEstimator>,
    ) -> Self {
        Self {
            validation: ValidationPipeline::new(config.validation.clone(), Arc::clone(&decoder), estimator),
            thumbnails: ThumbnailExtractor::new(config.thumbnail.clone(), Arc::clone(&decoder)),
            compression: CompressionEngine::new(config.compression.clone(), decoder, encoders),
        }
    }

    pub fn validation(&self) -> &ValidationPipeline {
        &self.validation
    }

    pub fn compression(&self) -> &CompressionEngine {
        &self.compression
    }

    /// Run every stage over `file`. Only a validation failure is an error.
    pub fn process(
        &self,
        file: MediaFile,
        source: AssetSource,
        cancel: &CancellationToken,
    ) -> Result<ProcessedMedia, ValidationError> {
        let (duration, _) = self.validate(&file, source).into_parts()?;
        Ok(self.process_validated(file, duration, source, cancel))
    }

    pub fn validate(&self, file: &MediaFile, source: AssetSource) -> StageOutcome<MeasuredDuration> {
        match self.validation.validate(file, source).into_result() {
            Ok(duration) => StageOutcome::Ok(duration),
            Err(reason) => StageOutcome::Fatal(reason),
        }
    }

    /// Thumbnail and compression stages for a file that already passed `validate`.
    pub fn process_validated(
        &self,
        file: MediaFile,
        duration: MeasuredDuration,
        source: AssetSource,
        cancel: &CancellationToken,
    ) -> ProcessedMedia {
        let mut degradations = Vec::new();

        let (thumbnail, reason) = self.thumbnail_stage(&file).settle();
        degradations.extend(reason);

        let (deliverable, reason) = self.compression_stage(file, duration, source, cancel).settle();
        degradations.extend(reason);

        let asset = MediaAsset::new(
            deliverable.file,
            deliverable.duration_secs,
            thumbnail,
            source,
            deliverable.compressed,
        );
        log::info!(
            "Processed {} video: {} ({} bytes, {:.1}s, compressed: {}, thumbnail: {}, degradations: {})",
            source,
            asset.file.name,
            asset.size_bytes,
            asset.duration_secs,
            asset.compressed,
            asset.thumbnail.is_some(),
            degradations.len()
        );
        ProcessedMedia { asset, degradations }
    }

    fn thumbnail_stage(&self, file: &MediaFile) -> StageOutcome<Option<Thumbnail>, Infallible> {
        match self.thumbnails.extract(file) {
            Ok(thumbnail) => StageOutcome::Ok(Some(thumbnail)),
            Err(e) => {
                log::warn!("Thumbnail extraction failed for {}: {}; continuing without", file.name, e);
                StageOutcome::Degraded(None, e)
            }
        }
    }

    fn compression_stage(
        &self,
        file: MediaFile,
        duration: MeasuredDuration,
        source: AssetSource,
        cancel: &CancellationToken,
    ) -> StageOutcome<Deliverable, Infallible> {
        if !self.compression.should_compress(&file) {
            return StageOutcome::Ok(Deliverable {
                file,
                duration_secs: duration.secs,
                compressed: false,
            });
        }

        let result = self.compression.compress(&file, duration, cancel).and_then(|out| {
            // Compression only changes size and resolution, never the bounds verdict.
            self.validation
                .check_duration(out.duration_secs, source)
                .map_err(|e| ProcessingError::InvalidOutput(e.to_string()))?;
            Ok(out)
        });

        match result {
            Ok(out) => StageOutcome::Ok(Deliverable {
                file: out.file,
                duration_secs: out.duration_secs,
                compressed: true,
            }),
            Err(e) => {
                log::warn!("Compression failed for {}: {}; keeping original", file.name, e);
                StageOutcome::Degraded(
                    Deliverable {
                        file,
                        duration_secs: duration.secs,
                        compressed: false,
                    },
                    e,
                )
            }
        }
    }
}
