use crate::models::config::StreamConstraints;
use crate::models::device::LiveStream;
use crate::models::error::DeviceError;
use crate::traits::capture_backend::{CaptureBackend, ChunkCallback};

/// Owns the single live camera+microphone stream of a controller.
///
/// `acquire` while holding a stream releases the old one first; `release` is
/// idempotent. The stream is also released on drop.
pub struct StreamResourceManager<B: CaptureBackend> {
    backend: B,
    stream: Option<LiveStream>,
    recording: bool,
}

impl<B: CaptureBackend> StreamResourceManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            stream: None,
            recording: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_holding(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn stream(&self) -> Option<&LiveStream> {
        self.stream.as_ref()
    }

    pub fn acquire(&mut self, constraints: &StreamConstraints) -> Result<&LiveStream, DeviceError> {
        if self.stream.is_some() {
            log::debug!("Releasing previous stream before acquiring a new one");
            self.release();
        }

        let stream = self.backend.open_stream(constraints)?;
        if !stream.has_video() {
            self.backend.stop_tracks(&stream);
            return Err(DeviceError::NoStream);
        }

        log::info!(
            "Acquired stream {} ({} tracks, audio: {})",
            stream.id,
            stream.tracks.len(),
            stream.has_audio()
        );
        Ok(self.stream.insert(stream))
    }

    /// Stop every track of the held stream. No-op when nothing is held.
    pub fn release(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        if self.recording {
            self.recording = false;
            if let Err(e) = self.backend.stop_recording(&stream) {
                log::warn!("Failed to stop recorder on release: {}", e);
            }
        }
        self.backend.stop_tracks(&stream);
        log::info!("Released stream {}", stream.id);
    }

    /// First entry of `preferences` the recorder supports.
    pub fn select_recording_format(&self, preferences: &[String]) -> Result<String, DeviceError> {
        preferences
            .iter()
            .find(|mime| self.backend.is_format_supported(mime))
            .cloned()
            .ok_or_else(|| {
                DeviceError::Unsupported(format!("none of [{}] can be recorded", preferences.join(", ")))
            })
    }

    pub fn start_recording(&mut self, mime_type: &str, sink: ChunkCallback) -> Result<(), DeviceError> {
        let stream = self.stream.as_ref().ok_or(DeviceError::NoStream)?;
        if self.recording {
            return Err(DeviceError::InUse("recorder already running".into()));
        }
        self.backend.start_recording(stream, mime_type, sink)?;
        self.recording = true;
        log::info!("Recording {} as {}", stream.id, mime_type);
        Ok(())
    }

    /// Stop the recorder, returning once every chunk has been delivered.
    pub fn stop_recording(&mut self) -> Result<(), DeviceError> {
        if !self.recording {
            return Ok(());
        }
        self.recording = false;
        let stream = self.stream.as_ref().ok_or(DeviceError::NoStream)?;
        self.backend.stop_recording(stream)
    }
}

impl<B: CaptureBackend> Drop for StreamResourceManager<B> {
    fn drop(&mut self) {
        self.release();
    }
}
