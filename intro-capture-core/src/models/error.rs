use thiserror::Error;

/// Camera/microphone acquisition failures.
///
/// Fatal to starting a capture, recoverable by retrying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("camera or microphone permission denied")]
    PermissionDenied,

    #[error("no camera or microphone found")]
    NotFound,

    #[error("camera or microphone already in use: {0}")]
    InUse(String),

    #[error("recording not supported: {0}")]
    Unsupported(String),

    #[error("no live stream")]
    NoStream,

    #[error("device failure: {0}")]
    Other(String),
}

/// A file failed one of the format/size/duration checks.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("file format not supported ({mime_type}); use MP4, WebM, OGG, or MOV files")]
    UnsupportedFormat { mime_type: String },

    #[error("file size must be under {}MB, current size: {:.1}MB", mib(.max_bytes), mib(.size_bytes))]
    TooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("video must be at least {min_secs} seconds long, current duration: {duration_secs:.1}s")]
    TooShort { duration_secs: f64, min_secs: f64 },

    #[error("video must be under {max_secs} seconds long, current duration: {duration_secs:.1}s")]
    TooLong { duration_secs: f64, max_secs: f64 },

    #[error("file is empty")]
    Empty,
}

fn mib(bytes: &u64) -> f64 {
    *bytes as f64 / (1024.0 * 1024.0)
}

/// Thumbnail or compression failure. Never fatal to the pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProcessingError {
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("seek to {position_secs:.2}s failed: {reason}")]
    Seek { position_secs: f64, reason: String },

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("compressed output rejected: {0}")]
    InvalidOutput(String),

    #[error("compression cancelled")]
    Cancelled,

    #[error("compression timed out after {0:.1}s")]
    TimedOut(f64),
}

/// Object upload failure, surfaced verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("upload failed: {0}")]
pub struct UploadError(pub String);

/// Record store failure, surfaced verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("persist failed: {0}")]
pub struct PersistError(pub String);

/// Umbrella error returned by the capture controller and the save/delete flows.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CaptureError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("video cannot be deleted for {remaining_days} more days; you can replace it with a new video instead")]
    LockViolation { remaining_days: u32 },

    #[error("cannot {action} while {state}")]
    InvalidState { state: &'static str, action: &'static str },

    #[error("invalid profile details: {0}")]
    InvalidDetails(String),

    #[error("configuration failed: {0}")]
    Configuration(String),
}
