use std::fmt;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Where a media asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetSource {
    Recorded,
    Uploaded,
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recorded => f.write_str("recorded"),
            Self::Uploaded => f.write_str("uploaded"),
        }
    }
}

/// Binary payload plus its declared mime type.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Mime type without parameters, lowercased (`video/webm;codecs=vp9` → `video/webm`).
    pub fn base_mime_type(&self) -> String {
        base_mime_type(&self.mime_type)
    }

    /// SHA-256 hex digest of the payload.
    pub fn checksum(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

// Payloads run to tens of megabytes; keep them out of debug output.
impl fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

pub fn base_mime_type(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// File extension conventionally used for a video mime type.
pub fn extension_for(mime_type: &str) -> &'static str {
    match base_mime_type(mime_type).as_str() {
        "video/mp4" => "mp4",
        "video/ogg" => "ogv",
        "video/quicktime" => "mov",
        _ => "webm",
    }
}

/// Encoded still image derived from a video.
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thumbnail")
            .field("mime_type", &self.mime_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// The finalized, pipeline-processed capture ready for persistence.
///
/// `duration_secs` and `size_bytes` always describe `file` as it is now,
/// i.e. after compression when compression was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    pub file: MediaFile,
    pub duration_secs: f64,
    pub size_bytes: u64,
    pub thumbnail: Option<Thumbnail>,
    pub source: AssetSource,
    pub compressed: bool,
    pub checksum: String,
}

impl MediaAsset {
    pub fn new(
        file: MediaFile,
        duration_secs: f64,
        thumbnail: Option<Thumbnail>,
        source: AssetSource,
        compressed: bool,
    ) -> Self {
        let size_bytes = file.size_bytes();
        let checksum = file.checksum();
        Self {
            file,
            duration_secs,
            size_bytes,
            thumbnail,
            source,
            compressed,
            checksum,
        }
    }
}

/// Decoded container metadata. `duration_secs` may be non-finite for
/// recorder outputs that never wrote a duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaMetadata {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

impl MediaMetadata {
    pub fn has_usable_duration(&self) -> bool {
        self.duration_secs.is_finite() && self.duration_secs > 0.0
    }
}

/// One decoded video frame.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub timestamp_secs: f64,
    pub image: RgbImage,
}

/// Target settings handed to an encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub bitrate_bps: u64,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_mime_strips_codec_parameters() {
        assert_eq!(base_mime_type("video/webm;codecs=vp9"), "video/webm");
        assert_eq!(base_mime_type(" Video/MP4 "), "video/mp4");
        assert_eq!(base_mime_type(""), "");
    }

    #[test]
    fn asset_size_and_checksum_follow_file() {
        let file = MediaFile::new("clip.webm", "video/webm", vec![1, 2, 3, 4]);
        let asset = MediaAsset::new(file.clone(), 12.0, None, AssetSource::Recorded, false);

        assert_eq!(asset.size_bytes, 4);
        assert_eq!(asset.checksum, file.checksum());
        assert_eq!(asset.checksum.len(), 64);
    }

    #[test]
    fn extension_matches_container() {
        assert_eq!(extension_for("video/webm;codecs=vp9"), "webm");
        assert_eq!(extension_for("video/mp4"), "mp4");
        assert_eq!(extension_for("video/quicktime"), "mov");
    }

    #[test]
    fn asset_source_serializes_lowercase() {
        let json = serde_json::to_string(&AssetSource::Uploaded).unwrap();
        assert_eq!(json, "\"uploaded\"");
    }
}
