use std::sync::Arc;

use crate::models::config::StreamConstraints;
use crate::models::device::LiveStream;
use crate::models::error::DeviceError;

/// Callback invoked with each encoded chunk while recording.
///
/// May fire on a device thread; keep processing minimal.
pub type ChunkCallback = Arc<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// Interface for platform-specific camera+microphone access.
///
/// Implemented by:
/// - `SimulatedCamera` (intro-capture-sim)
/// - Future: native camera backends
///
/// Only `StreamResourceManager` calls into a backend.
pub trait CaptureBackend: Send {
    /// Open a combined audio/video stream honouring `constraints` where possible.
    fn open_stream(&mut self, constraints: &StreamConstraints) -> Result<LiveStream, DeviceError>;

    /// Stop every track of `stream`. Must tolerate streams already stopped.
    fn stop_tracks(&mut self, stream: &LiveStream);

    /// Whether the recorder can produce `mime_type` (e.g. `video/webm;codecs=vp9`).
    fn is_format_supported(&self, mime_type: &str) -> bool;

    /// Start recording `stream`, delivering chunks to `sink` as they are produced.
    fn start_recording(
        &mut self,
        stream: &LiveStream,
        mime_type: &str,
        sink: ChunkCallback,
    ) -> Result<(), DeviceError>;

    /// Stop recording. Returns once every chunk has been handed to the sink.
    fn stop_recording(&mut self, stream: &LiveStream) -> Result<(), DeviceError>;
}
