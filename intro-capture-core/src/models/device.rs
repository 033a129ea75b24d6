use serde::{Deserialize, Serialize};

/// Kind of media track in a live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// One track of a live stream, as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub id: String,
    pub kind: TrackKind,
    pub label: String,
}

/// Handle to an open camera+microphone stream.
///
/// Not `Clone`: the stream resource manager holds the only handle.
#[derive(Debug, PartialEq, Eq)]
pub struct LiveStream {
    pub id: String,
    pub tracks: Vec<TrackInfo>,
}

impl LiveStream {
    pub fn has_video(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == TrackKind::Video)
    }

    pub fn has_audio(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == TrackKind::Audio)
    }
}
