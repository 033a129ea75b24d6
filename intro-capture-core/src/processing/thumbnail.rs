use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;

use crate::models::config::ThumbnailSettings;
use crate::models::error::ProcessingError;
use crate::models::media::{MediaFile, Thumbnail};
use crate::processing::frame_scaler::scale_frame;
use crate::traits::media_codec::MediaDecoder;

/// Derives a single JPEG still from a video.
pub struct ThumbnailExtractor {
    settings: ThumbnailSettings,
    decoder: Arc<dyn MediaDecoder>,
}

impl ThumbnailExtractor {
    pub fn new(settings: ThumbnailSettings, decoder: Arc<dyn MediaDecoder>) -> Self {
        Self { settings, decoder }
    }

    /// Seek position for a video of the given duration: `min(max_seek, duration / 2)`.
    pub fn seek_position(&self, duration_secs: f64) -> f64 {
        if duration_secs.is_finite() && duration_secs > 0.0 {
            self.settings.max_seek_secs.min(duration_secs / 2.0)
        } else {
            self.settings.max_seek_secs
        }
    }

    pub fn extract(&self, file: &MediaFile) -> Result<Thumbnail, ProcessingError> {
        let mut source = self.decoder.open(file)?;
        let position_secs = self.seek_position(source.metadata().duration_secs);

        source.seek(position_secs)?;
        let frame = source.next_frame()?.ok_or_else(|| ProcessingError::Seek {
            position_secs,
            reason: "no frame at position".into(),
        })?;

        let raster = scale_frame(&frame.image, self.settings.width, self.settings.height);

        let mut bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, self.settings.jpeg_quality);
        encoder
            .encode_image(&*raster)
            .map_err(|e| ProcessingError::Encode(format!("failed to encode thumbnail: {}", e)))?;

        log::debug!(
            "Extracted {}x{} thumbnail at {:.2}s from {} ({} bytes)",
            self.settings.width,
            self.settings.height,
            frame.timestamp_secs,
            file.name,
            bytes.len()
        );

        Ok(Thumbnail {
            mime_type: "image/jpeg".into(),
            width: self.settings.width,
            height: self.settings.height,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::{MediaMetadata, VideoFrame};
    use crate::traits::media_codec::FrameSource;
    use image::RgbImage;
    use parking_lot::Mutex;

    /// Plays `frame_count` solid frames at 10fps and records seek positions.
    struct Clip {
        duration_secs: f64,
        frame_count: u32,
        seeks: Arc<Mutex<Vec<f64>>>,
        fail_open: bool,
    }

    struct ClipSource {
        metadata: MediaMetadata,
        next: u32,
        frame_count: u32,
        seeks: Arc<Mutex<Vec<f64>>>,
    }

    impl MediaDecoder for Clip {
        fn read_metadata(&self, _file: &MediaFile) -> Result<MediaMetadata, ProcessingError> {
            Ok(self.metadata())
        }

        fn open(&self, _file: &MediaFile) -> Result<Box<dyn FrameSource>, ProcessingError> {
            if self.fail_open {
                return Err(ProcessingError::Decode("unreadable".into()));
            }
            Ok(Box::new(ClipSource {
                metadata: self.metadata(),
                next: 0,
                frame_count: self.frame_count,
                seeks: Arc::clone(&self.seeks),
            }))
        }
    }

    impl Clip {
        fn new(duration_secs: f64, frame_count: u32) -> Self {
            Self {
                duration_secs,
                frame_count,
                seeks: Arc::new(Mutex::new(Vec::new())),
                fail_open: false,
            }
        }

        fn metadata(&self) -> MediaMetadata {
            MediaMetadata {
                duration_secs: self.duration_secs,
                width: 64,
                height: 36,
                frame_rate: 10.0,
            }
        }
    }

    impl FrameSource for ClipSource {
        fn metadata(&self) -> MediaMetadata {
            self.metadata
        }

        fn seek(&mut self, position_secs: f64) -> Result<(), ProcessingError> {
            self.seeks.lock().push(position_secs);
            self.next = (position_secs * 10.0).floor() as u32;
            Ok(())
        }

        fn next_frame(&mut self) -> Result<Option<VideoFrame>, ProcessingError> {
            if self.next >= self.frame_count {
                return Ok(None);
            }
            let frame = VideoFrame {
                timestamp_secs: self.next as f64 / 10.0,
                image: RgbImage::from_pixel(64, 36, image::Rgb([200, 40, 40])),
            };
            self.next += 1;
            Ok(Some(frame))
        }
    }

    fn file() -> MediaFile {
        MediaFile::new("clip.webm", "video/webm", vec![1; 16])
    }

    #[test]
    fn extracts_jpeg_at_configured_size() {
        let clip = Arc::new(Clip::new(12.0, 120));
        let extractor = ThumbnailExtractor::new(ThumbnailSettings::default(), clip.clone());

        let thumb = extractor.extract(&file()).unwrap();
        assert_eq!((thumb.width, thumb.height), (320, 180));
        assert_eq!(thumb.mime_type, "image/jpeg");
        // JPEG SOI marker
        assert_eq!(&thumb.bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&thumb.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 180));
        assert_eq!(*clip.seeks.lock(), vec![1.0]);
    }

    #[test]
    fn seeks_to_midpoint_of_short_clips() {
        let extractor = ThumbnailExtractor::new(ThumbnailSettings::default(), Arc::new(Clip::new(1.0, 10)));
        assert_eq!(extractor.seek_position(1.0), 0.5);
        assert_eq!(extractor.seek_position(f64::INFINITY), 1.0);
        assert_eq!(extractor.seek_position(30.0), 1.0);
    }

    #[test]
    fn missing_frame_is_a_seek_error() {
        let extractor = ThumbnailExtractor::new(ThumbnailSettings::default(), Arc::new(Clip::new(12.0, 5)));
        assert!(matches!(extractor.extract(&file()), Err(ProcessingError::Seek { .. })));
    }

    #[test]
    fn decode_failure_is_reported() {
        let mut clip = Clip::new(12.0, 120);
        clip.fail_open = true;
        let extractor = ThumbnailExtractor::new(ThumbnailSettings::default(), Arc::new(clip));
        assert!(matches!(extractor.extract(&file()), Err(ProcessingError::Decode(_))));
    }
}
