use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::media::{extension_for, MediaFile};
use crate::traits::capture_backend::ChunkCallback;

/// One record-from-device-to-stop interval.
///
/// Chunks are appended by the recorder callback, possibly from a device
/// thread, and concatenated into a single file when the session ends.
pub struct RecordingSession {
    id: Uuid,
    mime_type: String,
    started_at: Instant,
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingSession {
    pub fn new(mime_type: impl Into<String>, started_at: Instant) -> Self {
        Self {
            id: Uuid::new_v4(),
            mime_type: mime_type.into(),
            started_at,
            chunks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.started_at).as_secs_f64()
    }

    /// Callback handed to the recorder. Empty chunks are dropped.
    pub fn chunk_sink(&self) -> ChunkCallback {
        let chunks = Arc::clone(&self.chunks);
        Arc::new(move |chunk: &[u8]| {
            if !chunk.is_empty() {
                chunks.lock().push(chunk.to_vec());
            }
        })
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().len()
    }

    pub fn buffered_bytes(&self) -> usize {
        self.chunks.lock().iter().map(Vec::len).sum()
    }

    /// Concatenate the chunks into `intro_video_<id>.<ext>`.
    pub fn into_file(self) -> MediaFile {
        let chunks = std::mem::take(&mut *self.chunks.lock());
        let bytes = chunks.concat();
        let name = format!("intro_video_{}.{}", self.id, extension_for(&self.mime_type));
        MediaFile::new(name, self.mime_type, bytes)
    }

    pub fn discard(self) {
        let dropped = std::mem::take(&mut *self.chunks.lock());
        log::debug!("Discarded recording {} ({} chunks)", self.id, dropped.len());
    }
}
