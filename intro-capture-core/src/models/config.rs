use serde::{Deserialize, Serialize};

use crate::policy::lock_policy::DEFAULT_LOCK_WINDOW_DAYS;

const MIB: u64 = 1024 * 1024;

/// Which camera to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

/// Stream request sent to the capture device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConstraints {
    pub facing_mode: FacingMode,
    /// Ideal width in pixels (default: 1280).
    pub ideal_width: u32,
    /// Ideal height in pixels (default: 720).
    pub ideal_height: u32,
    /// Ideal frame rate (default: 30).
    pub ideal_frame_rate: u32,
    pub audio: bool,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::User,
            ideal_width: 1280,
            ideal_height: 720,
            ideal_frame_rate: 30,
            audio: true,
        }
    }
}

/// Format/size/duration limits enforced by the validation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    pub accepted_mime_types: Vec<String>,
    pub max_size_bytes: u64,
    pub min_duration_secs: f64,
    pub max_duration_secs: f64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            accepted_mime_types: vec![
                "video/mp4".into(),
                "video/webm".into(),
                "video/ogg".into(),
                "video/quicktime".into(),
            ],
            max_size_bytes: 50 * MIB,
            min_duration_secs: 10.0,
            max_duration_secs: 60.0,
        }
    }
}

/// Still-frame preview settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailSettings {
    pub width: u32,
    pub height: u32,
    /// JPEG quality, 1–100 (default: 80).
    pub jpeg_quality: u8,
    /// Upper bound on the seek position; the extractor seeks to
    /// `min(max_seek_secs, duration / 2)`.
    pub max_seek_secs: f64,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            width: 320,
            height: 180,
            jpeg_quality: 80,
            max_seek_secs: 1.0,
        }
    }
}

/// Re-encode settings for oversized captures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    /// Files strictly larger than this are compressed (default: 10 MiB).
    pub threshold_bytes: u64,
    pub max_width: u32,
    pub max_height: u32,
    pub frame_rate: u32,
    pub bitrate_bps: u64,
    pub output_mime_type: String,
    /// Wall-clock budget for one compression run (None = unbounded).
    pub timeout_secs: Option<f64>,
    /// Allowed drift between source and output duration.
    pub duration_tolerance_secs: f64,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            threshold_bytes: 10 * MIB,
            max_width: 1280,
            max_height: 720,
            frame_rate: 30,
            bitrate_bps: 2_500_000,
            output_mime_type: "video/webm;codecs=vp9".into(),
            timeout_secs: Some(120.0),
            duration_tolerance_secs: 1.0,
        }
    }
}

/// Configuration for the capture controller and its processing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfiguration {
    pub constraints: StreamConstraints,

    /// Recording output formats, most preferred first.
    pub preferred_mime_types: Vec<String>,

    /// Countdown between preview and recording, in whole seconds (default: 3).
    pub countdown_secs: u32,

    /// Recording is stopped automatically after this long (None = unlimited).
    pub max_recording_secs: Option<f64>,

    pub validation: ValidationLimits,
    pub thumbnail: ThumbnailSettings,
    pub compression: CompressionSettings,

    /// Calibration for estimating duration from file size when the container
    /// carries no usable duration (default: 1 MiB per second).
    pub estimate_bytes_per_second: f64,

    /// Days after the first save during which deletion is refused (default: 20).
    pub lock_window_days: u32,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.preferred_mime_types.is_empty() {
            return Err("at least one recording format is required".into());
        }
        if self.validation.accepted_mime_types.is_empty() {
            return Err("at least one accepted format is required".into());
        }
        if self.validation.max_size_bytes == 0 {
            return Err("max size must be positive".into());
        }
        let limits = &self.validation;
        if !(limits.min_duration_secs >= 0.0 && limits.min_duration_secs <= limits.max_duration_secs) {
            return Err(format!(
                "invalid duration bounds: [{}, {}]",
                limits.min_duration_secs, limits.max_duration_secs
            ));
        }
        if limits.max_duration_secs < 1.0 {
            return Err("max duration must be at least one second".into());
        }
        if let Some(max) = self.max_recording_secs {
            if !(max.is_finite() && max > 0.0) {
                return Err("max recording time must be positive".into());
            }
            // The limit is enforced by polling, so a stop always lands a little late.
            if max >= limits.max_duration_secs {
                return Err(format!(
                    "max recording time ({}s) must be below the maximum duration ({}s)",
                    max, limits.max_duration_secs
                ));
            }
        }
        if self.thumbnail.width == 0 || self.thumbnail.height == 0 {
            return Err("thumbnail dimensions must be positive".into());
        }
        if !(1..=100).contains(&self.thumbnail.jpeg_quality) {
            return Err(format!("unsupported jpeg quality: {}", self.thumbnail.jpeg_quality));
        }
        let compression = &self.compression;
        if compression.max_width < 2 || compression.max_height < 2 {
            return Err("compression bounds must be at least 2x2".into());
        }
        if compression.frame_rate == 0 {
            return Err("compression frame rate must be positive".into());
        }
        if let Some(timeout) = compression.timeout_secs {
            if !(timeout.is_finite() && timeout > 0.0) {
                return Err(format!("invalid compression timeout: {}", timeout));
            }
        }
        if compression.bitrate_bps == 0 {
            return Err("compression bitrate must be positive".into());
        }
        if self.estimate_bytes_per_second <= 0.0 {
            return Err("estimation rate must be positive".into());
        }
        Ok(())
    }

    /// Parse a (possibly partial) JSON configuration; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| format!("failed to parse configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            constraints: StreamConstraints::default(),
            preferred_mime_types: vec![
                "video/webm;codecs=vp9".into(),
                "video/webm".into(),
                "video/mp4".into(),
            ],
            countdown_secs: 3,
            max_recording_secs: Some(59.0),
            validation: ValidationLimits::default(),
            thumbnail: ThumbnailSettings::default(),
            compression: CompressionSettings::default(),
            estimate_bytes_per_second: MIB as f64,
            lock_window_days: DEFAULT_LOCK_WINDOW_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CaptureConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.countdown_secs, 3);
        assert_eq!(config.validation.max_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.compression.threshold_bytes, 10 * 1024 * 1024);
        assert_eq!(config.lock_window_days, 20);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = CaptureConfiguration::from_json(
            r#"{ "countdown_secs": 5, "validation": { "max_duration_secs": 90 } }"#,
        )
        .unwrap();

        assert_eq!(config.countdown_secs, 5);
        assert_eq!(config.validation.max_duration_secs, 90.0);
        assert_eq!(config.validation.min_duration_secs, 10.0);
        assert_eq!(config.thumbnail.width, 320);
    }

    #[test]
    fn rejects_inverted_duration_bounds() {
        let mut config = CaptureConfiguration::default();
        config.validation.min_duration_secs = 70.0;
        assert!(config.validate().unwrap_err().contains("invalid duration bounds"));
    }

    #[test]
    fn recording_limit_must_stay_below_max_duration() {
        let mut config = CaptureConfiguration::default();
        assert!(config.max_recording_secs.unwrap() < config.validation.max_duration_secs);

        config.max_recording_secs = Some(60.0);
        assert!(config.validate().unwrap_err().contains("below the maximum duration"));

        config.max_recording_secs = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_or_nan_timeout() {
        for timeout in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let mut config = CaptureConfiguration::default();
            config.compression.timeout_secs = Some(timeout);
            assert!(config.validate().unwrap_err().contains("compression timeout"));
        }
    }

    #[test]
    fn rejects_bad_json() {
        assert!(CaptureConfiguration::from_json("{ not json").is_err());
        assert!(CaptureConfiguration::from_json(r#"{ "preferred_mime_types": [] }"#).is_err());
    }
}
