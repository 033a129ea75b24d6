use image::RgbImage;

use crate::models::error::ProcessingError;
use crate::models::media::{EncodeSettings, MediaFile, MediaMetadata, VideoFrame};

/// Decoder side of a media backend.
pub trait MediaDecoder: Send + Sync {
    /// Read container metadata without decoding frames.
    fn read_metadata(&self, file: &MediaFile) -> Result<MediaMetadata, ProcessingError>;

    /// Open a sequential frame reader positioned at the start of playback.
    fn open(&self, file: &MediaFile) -> Result<Box<dyn FrameSource>, ProcessingError>;
}

/// Sequential access to decoded frames.
pub trait FrameSource: Send {
    fn metadata(&self) -> MediaMetadata;

    /// Position the reader so the next frame is the one showing at `position_secs`.
    fn seek(&mut self, position_secs: f64) -> Result<(), ProcessingError>;

    /// Next frame in presentation order, `None` once playback has ended.
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, ProcessingError>;
}

/// Encoder side of a media backend.
pub trait EncoderFactory: Send + Sync {
    fn create(&self, settings: &EncodeSettings) -> Result<Box<dyn FrameSink>, ProcessingError>;
}

/// Receives frames in presentation order and produces one output stream.
pub trait FrameSink: Send {
    /// Append `image` as the frame shown at `timestamp_secs`. The same raster
    /// may be pushed for several consecutive timestamps.
    fn push(&mut self, timestamp_secs: f64, image: &RgbImage) -> Result<(), ProcessingError>;

    fn finish(self: Box<Self>) -> Result<MediaFile, ProcessingError>;
}
