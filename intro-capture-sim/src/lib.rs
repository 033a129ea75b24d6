//! # intro-capture-sim
//!
//! In-process backends for intro-capture-kit.
//!
//! Provides:
//! - `SimulatedCamera` — camera+microphone backend with failure injection
//! - `SyntheticDecoder` / `SyntheticEncoderFactory` — a procedural video codec
//! - `InMemoryGateway` — object store + profile record store with a call log
//! - `ManualClock` — a clock that moves only when told to
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use intro_capture_core::{CaptureConfiguration, CaptureController, MediaPipeline};
//! use intro_capture_sim::{SimulatedCamera, SyntheticDecoder, SyntheticEncoderFactory};
//!
//! let config = CaptureConfiguration::default();
//! let pipeline = MediaPipeline::new(&config, Arc::new(SyntheticDecoder), Arc::new(SyntheticEncoderFactory));
//! let mut controller = CaptureController::new(SimulatedCamera::new(), config).unwrap();
//! controller.start_capture().unwrap();
//! ```

pub mod manual_clock;
pub mod memory_gateway;
pub mod simulated_camera;
pub mod synthetic_codec;

pub use manual_clock::ManualClock;
pub use memory_gateway::{GatewayCall, InMemoryGateway, ProfileRecord, StoredObject};
pub use simulated_camera::{CameraStats, SimulatedCamera};
pub use synthetic_codec::{SyntheticClip, SyntheticDecoder, SyntheticEncoderFactory};
