//! # intro-capture-core
//!
//! Platform-agnostic intro video capture core library.
//!
//! Provides the capture state machine, stream lifecycle management, media
//! validation, thumbnail extraction, compression, and the lock policy that
//! governs deleting a saved video. Camera backends implement the
//! `CaptureBackend` trait, media backends implement `MediaDecoder` /
//! `EncoderFactory`, and storage is reached through `PersistenceGateway`.
//!
//! ## Architecture
//!
//! ```text
//! intro-capture-core (this crate)
//! ├── traits/       ← CaptureBackend, CaptureDelegate, MediaDecoder, EncoderFactory,
//! │                   PersistenceGateway, DurationEstimator, Clock
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, MediaAsset, LockStatus, etc.
//! ├── processing/   ← ValidationPipeline, ThumbnailExtractor, CompressionEngine, MediaPipeline
//! ├── session/      ← CaptureController, StreamResourceManager, RecordingSession, PreviewRegistry
//! ├── policy/       ← lock window evaluation
//! └── storage/      ← save (publish) and delete (retention) flows over the gateway
//! ```

pub mod models;
pub mod policy;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::CaptureConfiguration;
pub use models::error::{CaptureError, DeviceError, PersistError, ProcessingError, UploadError, ValidationError};
pub use models::lock::LockStatus;
pub use models::media::{AssetSource, MediaAsset, MediaFile, Thumbnail};
pub use models::profile::{AssetKind, ProfileDetails, ProfileVideoUpdate, SavedVideo, VideoLockState};
pub use models::state::CaptureState;
pub use processing::cancel::CancellationToken;
pub use processing::pipeline::{MediaPipeline, ProcessedMedia, StageOutcome};
pub use session::controller::{CaptureController, ProcessingJob, ProcessingOutcome};
pub use session::stream_manager::StreamResourceManager;
pub use traits::capture_backend::{CaptureBackend, ChunkCallback};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::clock::{Clock, SystemClock};
pub use traits::duration_estimator::DurationEstimator;
pub use traits::media_codec::{EncoderFactory, FrameSink, FrameSource, MediaDecoder};
pub use traits::persistence::PersistenceGateway;
