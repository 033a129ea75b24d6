use std::sync::Arc;
use std::time::Instant;

use image::RgbImage;

use crate::models::config::CompressionSettings;
use crate::models::error::ProcessingError;
use crate::models::media::{extension_for, EncodeSettings, MediaFile};
use crate::processing::cancel::CancellationToken;
use crate::processing::duration::MeasuredDuration;
use crate::processing::frame_scaler::{fit_within, scale_frame};
use crate::traits::media_codec::{EncoderFactory, FrameSink, MediaDecoder};

/// Output of a successful compression run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedMedia {
    pub file: MediaFile,
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub frames_written: u64,
}

/// Emits output timestamps on a fixed grid (`origin + k / fps`).
struct FramePacer {
    origin: f64,
    fps: f64,
    emitted: u64,
}

impl FramePacer {
    fn new(origin: f64, fps: u32) -> Self {
        Self {
            origin,
            fps: fps as f64,
            emitted: 0,
        }
    }

    fn next_ts(&self) -> f64 {
        self.origin + self.emitted as f64 / self.fps
    }

    /// Push `image` for every output tick strictly before `until`, checking
    /// `budget` before each push.
    fn hold_until(
        &mut self,
        sink: &mut dyn FrameSink,
        image: &RgbImage,
        until: f64,
        budget: &dyn Fn() -> Result<(), ProcessingError>,
    ) -> Result<(), ProcessingError> {
        while self.next_ts() < until {
            budget()?;
            sink.push(self.next_ts(), image)?;
            self.emitted += 1;
        }
        Ok(())
    }
}

/// Re-encodes oversized captures at bounded resolution and a fixed frame rate.
///
/// Decodes the source frame by frame, scales each frame into the output
/// raster, and feeds a single encoder on a 30fps grid (sample-and-hold), so
/// the output keeps the source duration.
pub struct CompressionEngine {
    settings: CompressionSettings,
    decoder: Arc<dyn MediaDecoder>,
    encoders: Arc<dyn EncoderFactory>,
}

impl CompressionEngine {
    pub fn new(
        settings: CompressionSettings,
        decoder: Arc<dyn MediaDecoder>,
        encoders: Arc<dyn EncoderFactory>,
    ) -> Self {
        Self {
            settings,
            decoder,
            encoders,
        }
    }

    pub fn settings(&self) -> &CompressionSettings {
        &self.settings
    }

    pub fn should_compress(&self, file: &MediaFile) -> bool {
        file.size_bytes() > self.settings.threshold_bytes
    }

    /// Compress `file`. `source_duration` comes from validation; it stands in
    /// for the output duration when the output container reports none.
    pub fn compress(
        &self,
        file: &MediaFile,
        source_duration: MeasuredDuration,
        cancel: &CancellationToken,
    ) -> Result<CompressedMedia, ProcessingError> {
        let started = Instant::now();
        let mut source = self.decoder.open(file)?;
        let metadata = source.metadata();

        let (width, height) = fit_within(
            metadata.width,
            metadata.height,
            self.settings.max_width,
            self.settings.max_height,
        );
        if width == 0 || height == 0 {
            return Err(ProcessingError::Decode("source has no video track".into()));
        }

        let settings = EncodeSettings {
            mime_type: self.settings.output_mime_type.clone(),
            width,
            height,
            frame_rate: self.settings.frame_rate,
            bitrate_bps: self.settings.bitrate_bps,
            file_name: output_name(&file.name, &self.settings.output_mime_type),
        };
        let mut sink = self.encoders.create(&settings)?;
        let budget = || self.check_budget(cancel, started);

        let mut pacer: Option<FramePacer> = None;
        let mut held: Option<RgbImage> = None;
        let mut last_ts = 0.0;
        let mut source_frames = 0u64;

        while let Some(frame) = source.next_frame()? {
            budget()?;

            let pacer = pacer.get_or_insert_with(|| FramePacer::new(frame.timestamp_secs, self.settings.frame_rate));
            if let Some(image) = held.as_ref() {
                pacer.hold_until(sink.as_mut(), image, frame.timestamp_secs, &budget)?;
            }

            held = Some(scale_frame(&frame.image, width, height).into_owned());
            last_ts = frame.timestamp_secs;
            source_frames += 1;
        }

        let (Some(mut pacer), Some(image)) = (pacer, held) else {
            return Err(ProcessingError::Decode("source contained no frames".into()));
        };

        // Playback ended; hold the last frame until the end of the source.
        let frame_interval = 1.0 / self.settings.frame_rate as f64;
        let end = if metadata.has_usable_duration() {
            metadata.duration_secs
        } else if metadata.frame_rate > 0.0 {
            last_ts + 1.0 / metadata.frame_rate
        } else {
            last_ts + frame_interval
        };
        pacer.hold_until(sink.as_mut(), &image, end - frame_interval * 1e-3, &budget)?;
        if pacer.emitted == 0 {
            let until = pacer.next_ts() + frame_interval;
            pacer.hold_until(sink.as_mut(), &image, until, &budget)?;
        }

        let output = sink.finish()?;
        let frames_written = pacer.emitted;
        let duration_secs = match self.decoder.read_metadata(&output) {
            Ok(meta) if meta.has_usable_duration() => meta.duration_secs,
            _ => source_duration.secs,
        };

        log::info!(
            "Compressed {} from {} to {} bytes ({}x{} @ {}fps, {} source frames, {} output frames) in {:.1}s",
            file.name,
            file.size_bytes(),
            output.size_bytes(),
            width,
            height,
            self.settings.frame_rate,
            source_frames,
            frames_written,
            started.elapsed().as_secs_f64()
        );

        let compressed = CompressedMedia {
            file: output,
            duration_secs,
            width,
            height,
            frames_written,
        };
        self.verify(file, source_duration, &compressed)?;
        Ok(compressed)
    }

    fn check_budget(&self, cancel: &CancellationToken, started: Instant) -> Result<(), ProcessingError> {
        if cancel.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }
        if let Some(limit) = self.settings.timeout_secs {
            let elapsed = started.elapsed().as_secs_f64();
            if elapsed > limit {
                return Err(ProcessingError::TimedOut(elapsed));
            }
        }
        Ok(())
    }

    /// Reject outputs that would be worse than keeping the original.
    fn verify(
        &self,
        original: &MediaFile,
        source_duration: MeasuredDuration,
        compressed: &CompressedMedia,
    ) -> Result<(), ProcessingError> {
        let size = compressed.file.size_bytes();
        if size == 0 {
            return Err(ProcessingError::InvalidOutput("encoder produced no data".into()));
        }
        if size >= original.size_bytes() {
            return Err(ProcessingError::InvalidOutput(format!(
                "output ({} bytes) is not smaller than input ({} bytes)",
                size,
                original.size_bytes()
            )));
        }
        // An estimated source duration is too rough to compare against.
        let drift = (compressed.duration_secs - source_duration.secs).abs();
        if !source_duration.estimated && drift > self.settings.duration_tolerance_secs {
            return Err(ProcessingError::InvalidOutput(format!(
                "duration changed from {:.1}s to {:.1}s",
                source_duration.secs, compressed.duration_secs
            )));
        }
        Ok(())
    }
}

fn output_name(name: &str, mime_type: &str) -> String {
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    };
    format!("{}.{}", stem, extension_for(mime_type))
}
