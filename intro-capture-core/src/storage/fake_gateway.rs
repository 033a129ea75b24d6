use parking_lot::Mutex;

use crate::models::error::{PersistError, UploadError};
use crate::models::profile::{AssetKind, ProfileVideoUpdate, VideoLockState};
use crate::traits::persistence::PersistenceGateway;

/// Single-owner gateway double that records every call.
#[derive(Default)]
pub(crate) struct FakeGateway {
    pub record: Mutex<VideoLockState>,
    pub calls: Mutex<Vec<String>>,
    pub upserts: Mutex<Vec<ProfileVideoUpdate>>,
    pub fail_thumbnail_upload: bool,
    pub fail_upsert: bool,
}

impl FakeGateway {
    pub fn with_record(record: VideoLockState) -> Self {
        Self {
            record: Mutex::new(record),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl PersistenceGateway for FakeGateway {
    fn upload_asset(
        &self,
        _owner_id: &str,
        kind: AssetKind,
        bytes: &[u8],
        _mime_type: &str,
    ) -> Result<String, UploadError> {
        self.calls.lock().push(format!("upload:{:?}", kind));
        if kind == AssetKind::Thumbnail && self.fail_thumbnail_upload {
            return Err(UploadError("bucket unavailable".into()));
        }
        Ok(format!("https://cdn.test/{:?}/{}", kind, bytes.len()))
    }

    fn upsert_profile_video(&self, _owner_id: &str, update: &ProfileVideoUpdate) -> Result<(), PersistError> {
        self.calls.lock().push("upsert".into());
        if self.fail_upsert {
            return Err(PersistError("row locked".into()));
        }
        let mut record = self.record.lock();
        record.intro_video_url = Some(update.intro_video_url.clone());
        record.video_thumbnail_url = update.video_thumbnail_url.clone();
        if let Some(at) = update.first_video_uploaded_at {
            record.first_upload_at = Some(at);
        }
        self.upserts.lock().push(update.clone());
        Ok(())
    }

    fn delete_profile_video(&self, _owner_id: &str) -> Result<(), PersistError> {
        self.calls.lock().push("delete".into());
        *self.record.lock() = VideoLockState::default();
        Ok(())
    }

    fn read_video_lock_state(&self, _owner_id: &str) -> Result<VideoLockState, PersistError> {
        self.calls.lock().push("read".into());
        Ok(self.record.lock().clone())
    }

    fn remove_asset(&self, _owner_id: &str, kind: AssetKind, _url: &str) -> Result<(), PersistError> {
        self.calls.lock().push(format!("remove:{:?}", kind));
        Ok(())
    }
}
