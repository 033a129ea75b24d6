//! Simulated camera+microphone backend.
//!
//! Opens fake streams, honours a configurable set of recorder formats, and on
//! `stop_recording` delivers a synthetic clip as a burst of chunks. Clones
//! share state, so a test can keep a handle to inspect or reconfigure the
//! camera after moving it into a controller.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use intro_capture_core::models::config::{FacingMode, StreamConstraints};
use intro_capture_core::models::device::{LiveStream, TrackInfo, TrackKind};
use intro_capture_core::models::error::DeviceError;
use intro_capture_core::traits::capture_backend::{CaptureBackend, ChunkCallback};

use crate::synthetic_codec::SyntheticClip;

/// Counters exposed for assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraStats {
    pub streams_opened: u32,
    pub streams_stopped: u32,
    pub recordings_started: u32,
    pub recordings_stopped: u32,
}

struct ActiveRecorder {
    stream_id: String,
    mime_type: String,
    sink: ChunkCallback,
}

struct CameraState {
    failure: Option<DeviceError>,
    supported_formats: Vec<String>,
    clip: SyntheticClip,
    clip_size_bytes: usize,
    chunk_count: usize,
    live: HashSet<String>,
    recorder: Option<ActiveRecorder>,
    last_constraints: Option<StreamConstraints>,
    stats: CameraStats,
}

#[derive(Clone)]
pub struct SimulatedCamera {
    inner: Arc<Mutex<CameraState>>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCamera {
    /// A camera recording VP9 WebM; each recording is a 15s, 1 MiB clip.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CameraState {
                failure: None,
                supported_formats: vec!["video/webm;codecs=vp9".into(), "video/webm".into()],
                clip: SyntheticClip::new(15.0),
                clip_size_bytes: 1024 * 1024,
                chunk_count: 8,
                live: HashSet::new(),
                recorder: None,
                last_constraints: None,
                stats: CameraStats::default(),
            })),
        }
    }

    /// Make every `open_stream` fail with `error` until cleared with `None`.
    pub fn set_failure(&self, error: Option<DeviceError>) {
        self.inner.lock().failure = error;
    }

    pub fn set_supported_formats<I, S>(&self, formats: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.lock().supported_formats = formats.into_iter().map(Into::into).collect();
    }

    /// What the next recording will deliver.
    pub fn set_recording(&self, clip: SyntheticClip, size_bytes: usize) {
        let mut inner = self.inner.lock();
        inner.clip = clip;
        inner.clip_size_bytes = size_bytes;
    }

    pub fn set_chunk_count(&self, chunk_count: usize) {
        self.inner.lock().chunk_count = chunk_count.max(1);
    }

    pub fn live_streams(&self) -> usize {
        self.inner.lock().live.len()
    }

    pub fn is_recording(&self) -> bool {
        self.inner.lock().recorder.is_some()
    }

    pub fn stats(&self) -> CameraStats {
        self.inner.lock().stats
    }

    pub fn last_constraints(&self) -> Option<StreamConstraints> {
        self.inner.lock().last_constraints.clone()
    }
}

impl CaptureBackend for SimulatedCamera {
    fn open_stream(&mut self, constraints: &StreamConstraints) -> Result<LiveStream, DeviceError> {
        let mut inner = self.inner.lock();
        if let Some(error) = inner.failure.clone() {
            log::warn!("Simulated camera refusing stream: {}", error);
            return Err(error);
        }

        inner.stats.streams_opened += 1;
        inner.last_constraints = Some(constraints.clone());
        let id = format!("sim-stream-{}", inner.stats.streams_opened);
        inner.live.insert(id.clone());

        let facing = match constraints.facing_mode {
            FacingMode::User => "front",
            FacingMode::Environment => "back",
        };
        let mut tracks = vec![TrackInfo {
            id: format!("{}-video", id),
            kind: TrackKind::Video,
            label: format!(
                "Simulated {} camera {}x{}@{}",
                facing, constraints.ideal_width, constraints.ideal_height, constraints.ideal_frame_rate
            ),
        }];
        if constraints.audio {
            tracks.push(TrackInfo {
                id: format!("{}-audio", id),
                kind: TrackKind::Audio,
                label: "Simulated microphone".into(),
            });
        }
        log::debug!("Simulated camera opened {}", id);
        Ok(LiveStream { id, tracks })
    }

    fn stop_tracks(&mut self, stream: &LiveStream) {
        let mut inner = self.inner.lock();
        if inner.live.remove(&stream.id) {
            inner.stats.streams_stopped += 1;
            log::debug!("Simulated camera stopped {}", stream.id);
        }
    }

    fn is_format_supported(&self, mime_type: &str) -> bool {
        self.inner.lock().supported_formats.iter().any(|m| m == mime_type)
    }

    fn start_recording(
        &mut self,
        stream: &LiveStream,
        mime_type: &str,
        sink: ChunkCallback,
    ) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        if !inner.live.contains(&stream.id) {
            return Err(DeviceError::NoStream);
        }
        if inner.recorder.is_some() {
            return Err(DeviceError::InUse("recorder already running".into()));
        }
        if !inner.supported_formats.iter().any(|m| m == mime_type) {
            return Err(DeviceError::Unsupported(mime_type.to_string()));
        }
        inner.stats.recordings_started += 1;
        inner.recorder = Some(ActiveRecorder {
            stream_id: stream.id.clone(),
            mime_type: mime_type.to_string(),
            sink,
        });
        Ok(())
    }

    fn stop_recording(&mut self, stream: &LiveStream) -> Result<(), DeviceError> {
        let (recorder, bytes, chunk_count) = {
            let mut inner = self.inner.lock();
            let Some(recorder) = inner.recorder.take() else {
                return Ok(());
            };
            if recorder.stream_id != stream.id {
                inner.recorder = Some(recorder);
                return Err(DeviceError::Other(format!("{} is not recording", stream.id)));
            }
            inner.stats.recordings_stopped += 1;
            (recorder, inner.clip.encode(inner.clip_size_bytes), inner.chunk_count)
        };

        // Deliver outside the lock; the sink may be slow.
        let chunk_len = bytes.len().div_ceil(chunk_count).max(1);
        for chunk in bytes.chunks(chunk_len) {
            (recorder.sink)(chunk);
            // Real recorders emit the odd empty chunk.
            (recorder.sink)(&[]);
        }
        log::debug!(
            "Simulated camera delivered {} bytes of {} in {} chunks",
            bytes.len(),
            recorder.mime_type,
            bytes.len().div_ceil(chunk_len)
        );
        Ok(())
    }
}
