//! Synthetic video container and codec.
//!
//! A synthetic file is `b"SYNV"`, a little-endian `u32` header length, a JSON
//! header describing the clip, then filler bytes up to the requested size.
//! Frames are generated procedurally from the header, so a clip of any length
//! or size costs only its byte count.
//!
//! ```text
//! ┌──────┬─────────┬──────────────────────────────┬─────────────┐
//! │ SYNV │ len u32 │ {"width":..,"height":..,...} │ filler ...  │
//! └──────┴─────────┴──────────────────────────────┴─────────────┘
//! ```

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use intro_capture_core::models::error::ProcessingError;
use intro_capture_core::models::media::{EncodeSettings, MediaFile, MediaMetadata, VideoFrame};
use intro_capture_core::traits::media_codec::{EncoderFactory, FrameSink, FrameSource, MediaDecoder};

const MAGIC: &[u8; 4] = b"SYNV";
const PREFIX_LEN: usize = MAGIC.len() + 4;

#[derive(Debug, Error, PartialEq)]
pub enum SyntheticFormatError {
    #[error("not a synthetic video (bad magic)")]
    BadMagic,

    #[error("truncated synthetic header")]
    Truncated,

    #[error("invalid synthetic header: {0}")]
    Header(String),
}

impl From<SyntheticFormatError> for ProcessingError {
    fn from(e: SyntheticFormatError) -> Self {
        ProcessingError::Decode(e.to_string())
    }
}

/// Header of a synthetic container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticHeader {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// `None` mimics recorders that never write a duration.
    pub duration_secs: Option<f64>,
    pub frame_count: u32,
    /// Frames can't be decoded; metadata still can.
    #[serde(default)]
    pub corrupt: bool,
}

/// Description of a clip to synthesize.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticClip {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration_secs: f64,
    pub report_duration: bool,
    pub corrupt: bool,
}

impl SyntheticClip {
    /// A small clip with a reported duration.
    pub fn new(duration_secs: f64) -> Self {
        Self {
            width: 64,
            height: 36,
            fps: 10.0,
            duration_secs,
            report_duration: true,
            corrupt: false,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    /// Leave the duration out of the header.
    pub fn without_duration(mut self) -> Self {
        self.report_duration = false;
        self
    }

    pub fn corrupt(mut self) -> Self {
        self.corrupt = true;
        self
    }

    pub fn header(&self) -> SyntheticHeader {
        SyntheticHeader {
            width: self.width,
            height: self.height,
            fps: self.fps,
            duration_secs: self.report_duration.then_some(self.duration_secs),
            frame_count: (self.duration_secs * self.fps).round().max(0.0) as u32,
            corrupt: self.corrupt,
        }
    }

    /// Container bytes padded to `size_bytes` (never shorter than the header).
    pub fn encode(&self, size_bytes: usize) -> Vec<u8> {
        encode_container(&self.header(), size_bytes)
    }

    pub fn to_file(&self, name: &str, mime_type: &str, size_bytes: usize) -> MediaFile {
        MediaFile::new(name, mime_type, self.encode(size_bytes))
    }
}

pub fn encode_container(header: &SyntheticHeader, size_bytes: usize) -> Vec<u8> {
    // Serializing a struct of plain numbers can't fail.
    let json = serde_json::to_vec(header).unwrap_or_default();
    let mut bytes = Vec::with_capacity(size_bytes.max(PREFIX_LEN + json.len()));
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&(json.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&json);
    if bytes.len() < size_bytes {
        bytes.resize(size_bytes, 0xA5);
    }
    bytes
}

pub fn parse_header(bytes: &[u8]) -> Result<SyntheticHeader, SyntheticFormatError> {
    let magic_len = bytes.len().min(MAGIC.len());
    if bytes.is_empty() || bytes[..magic_len] != MAGIC[..magic_len] {
        return Err(SyntheticFormatError::BadMagic);
    }
    if bytes.len() < PREFIX_LEN {
        return Err(SyntheticFormatError::Truncated);
    }
    let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let json = bytes
        .get(PREFIX_LEN..PREFIX_LEN + len)
        .ok_or(SyntheticFormatError::Truncated)?;
    serde_json::from_slice(json).map_err(|e| SyntheticFormatError::Header(e.to_string()))
}

fn metadata_of(header: &SyntheticHeader) -> MediaMetadata {
    MediaMetadata {
        duration_secs: header.duration_secs.unwrap_or(f64::INFINITY),
        width: header.width,
        height: header.height,
        frame_rate: header.fps,
    }
}

/// Decodes synthetic containers into procedurally generated frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticDecoder;

impl MediaDecoder for SyntheticDecoder {
    fn read_metadata(&self, file: &MediaFile) -> Result<MediaMetadata, ProcessingError> {
        Ok(metadata_of(&parse_header(&file.bytes)?))
    }

    fn open(&self, file: &MediaFile) -> Result<Box<dyn FrameSource>, ProcessingError> {
        let header = parse_header(&file.bytes)?;
        if header.corrupt {
            return Err(ProcessingError::Decode(format!("{}: corrupt frame data", file.name)));
        }
        Ok(Box::new(SyntheticSource { header, next: 0 }))
    }
}

struct SyntheticSource {
    header: SyntheticHeader,
    next: u32,
}

impl SyntheticSource {
    fn render(&self, index: u32) -> RgbImage {
        // A colour that drifts with the frame index, so consecutive frames differ.
        let shade = (index % 256) as u8;
        RgbImage::from_pixel(
            self.header.width,
            self.header.height,
            Rgb([shade, 255 - shade, (index / 256 % 256) as u8]),
        )
    }
}

impl FrameSource for SyntheticSource {
    fn metadata(&self) -> MediaMetadata {
        metadata_of(&self.header)
    }

    fn seek(&mut self, position_secs: f64) -> Result<(), ProcessingError> {
        if !position_secs.is_finite() || position_secs < 0.0 {
            return Err(ProcessingError::Seek {
                position_secs,
                reason: "position out of range".into(),
            });
        }
        self.next = ((position_secs * self.header.fps).floor() as u32).min(self.header.frame_count);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, ProcessingError> {
        if self.next >= self.header.frame_count {
            return Ok(None);
        }
        let frame = VideoFrame {
            timestamp_secs: self.next as f64 / self.header.fps,
            image: self.render(self.next),
        };
        self.next += 1;
        Ok(Some(frame))
    }
}

/// Produces synthetic containers whose size follows the target bitrate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticEncoderFactory;

impl EncoderFactory for SyntheticEncoderFactory {
    fn create(&self, settings: &EncodeSettings) -> Result<Box<dyn FrameSink>, ProcessingError> {
        if settings.frame_rate == 0 || settings.width == 0 || settings.height == 0 {
            return Err(ProcessingError::Encode(format!(
                "unsupported output {}x{} @ {}fps",
                settings.width, settings.height, settings.frame_rate
            )));
        }
        Ok(Box::new(SyntheticSink {
            settings: settings.clone(),
            frames: 0,
            last_ts: None,
        }))
    }
}

struct SyntheticSink {
    settings: EncodeSettings,
    frames: u32,
    last_ts: Option<f64>,
}

impl FrameSink for SyntheticSink {
    fn push(&mut self, timestamp_secs: f64, image: &RgbImage) -> Result<(), ProcessingError> {
        if image.dimensions() != (self.settings.width, self.settings.height) {
            return Err(ProcessingError::Encode(format!(
                "frame is {}x{}, encoder expects {}x{}",
                image.width(),
                image.height(),
                self.settings.width,
                self.settings.height
            )));
        }
        if self.last_ts.is_some_and(|last| timestamp_secs <= last) {
            return Err(ProcessingError::Encode(format!(
                "non-monotonic timestamp {:.3}s",
                timestamp_secs
            )));
        }
        self.last_ts = Some(timestamp_secs);
        self.frames += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<MediaFile, ProcessingError> {
        if self.frames == 0 {
            return Err(ProcessingError::Encode("no frames pushed".into()));
        }
        let fps = f64::from(self.settings.frame_rate);
        let duration_secs = f64::from(self.frames) / fps;
        let header = SyntheticHeader {
            width: self.settings.width,
            height: self.settings.height,
            fps,
            duration_secs: Some(duration_secs),
            frame_count: self.frames,
            corrupt: false,
        };
        let size_bytes = (self.settings.bitrate_bps as f64 / 8.0 * duration_secs) as usize;
        log::debug!(
            "Synthetic encoder wrote {} frames ({:.2}s, {} bytes) to {}",
            self.frames,
            duration_secs,
            size_bytes,
            self.settings.file_name
        );
        Ok(MediaFile::new(
            self.settings.file_name.clone(),
            self.settings.mime_type.clone(),
            encode_container(&header, size_bytes),
        ))
    }
}
