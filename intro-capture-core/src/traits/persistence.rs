use crate::models::error::{PersistError, UploadError};
use crate::models::profile::{AssetKind, ProfileVideoUpdate, VideoLockState};

/// Object store + profile record store used when saving or deleting an intro video.
///
/// The core never retries; every failure is surfaced to the caller.
pub trait PersistenceGateway: Send + Sync {
    /// Store `bytes` and return the public URL of the stored object.
    fn upload_asset(
        &self,
        owner_id: &str,
        kind: AssetKind,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<String, UploadError>;

    /// Insert or update the owner's profile video fields.
    ///
    /// A `None` first-upload timestamp must leave the stored one untouched.
    fn upsert_profile_video(&self, owner_id: &str, update: &ProfileVideoUpdate) -> Result<(), PersistError>;

    /// Clear the video url, thumbnail url and first-upload timestamp.
    fn delete_profile_video(&self, owner_id: &str) -> Result<(), PersistError>;

    fn read_video_lock_state(&self, owner_id: &str) -> Result<VideoLockState, PersistError>;

    /// Remove a previously uploaded object.
    fn remove_asset(&self, owner_id: &str, kind: AssetKind, url: &str) -> Result<(), PersistError>;
}
