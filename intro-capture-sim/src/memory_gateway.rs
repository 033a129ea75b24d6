//! In-memory object store + profile record store.
//!
//! A test double of the persistence contract: it keeps uploaded objects and
//! profile records in maps, logs every call, and can be told to fail.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use intro_capture_core::models::error::{PersistError, UploadError};
use intro_capture_core::models::media::extension_for;
use intro_capture_core::models::profile::{AssetKind, ProfileDetails, ProfileVideoUpdate, VideoLockState};
use intro_capture_core::traits::persistence::PersistenceGateway;

/// Persisted profile fields relevant to the intro video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub intro_video_url: Option<String>,
    pub video_thumbnail_url: Option<String>,
    pub first_video_uploaded_at: Option<DateTime<Utc>>,
    pub details: Option<ProfileDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub owner_id: String,
    pub kind: AssetKind,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// One gateway invocation, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Upload { owner_id: String, kind: AssetKind },
    Upsert { owner_id: String },
    Delete { owner_id: String },
    Read { owner_id: String },
    Remove { owner_id: String, kind: AssetKind },
}

impl GatewayCall {
    /// Whether the call changes stored state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, GatewayCall::Read { .. })
    }
}

#[derive(Debug, Default)]
struct Failures {
    upload: Vec<AssetKind>,
    upsert: bool,
    delete: bool,
    read: bool,
    remove: bool,
}

#[derive(Default)]
pub struct InMemoryGateway {
    records: Mutex<HashMap<String, ProfileRecord>>,
    objects: Mutex<HashMap<String, StoredObject>>,
    calls: Mutex<Vec<GatewayCall>>,
    failures: Mutex<Failures>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_record(&self, owner_id: &str, record: ProfileRecord) {
        self.records.lock().insert(owner_id.to_string(), record);
    }

    pub fn record(&self, owner_id: &str) -> Option<ProfileRecord> {
        self.records.lock().get(owner_id).cloned()
    }

    /// The owner's record as pretty JSON, for logs and snapshots.
    pub fn record_json(&self, owner_id: &str) -> Option<String> {
        self.record(owner_id)
            .and_then(|record| serde_json::to_string_pretty(&record).ok())
    }

    pub fn object(&self, url: &str) -> Option<StoredObject> {
        self.objects.lock().get(url).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    pub fn mutations(&self) -> Vec<GatewayCall> {
        self.calls.lock().iter().filter(|c| c.is_mutation()).cloned().collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn fail_uploads_of(&self, kind: AssetKind) {
        self.failures.lock().upload.push(kind);
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.failures.lock().upsert = fail;
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.failures.lock().delete = fail;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.failures.lock().read = fail;
    }

    pub fn fail_removes(&self, fail: bool) {
        self.failures.lock().remove = fail;
    }

    fn log(&self, call: GatewayCall) {
        log::debug!("Gateway call: {:?}", call);
        self.calls.lock().push(call);
    }
}

impl PersistenceGateway for InMemoryGateway {
    fn upload_asset(
        &self,
        owner_id: &str,
        kind: AssetKind,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<String, UploadError> {
        self.log(GatewayCall::Upload {
            owner_id: owner_id.to_string(),
            kind,
        });
        if self.failures.lock().upload.contains(&kind) {
            return Err(UploadError(format!("storage rejected {:?} upload", kind)));
        }

        let extension = match kind {
            AssetKind::Video => extension_for(mime_type),
            AssetKind::Thumbnail => "jpg",
        };
        let folder = match kind {
            AssetKind::Video => "intro-videos",
            AssetKind::Thumbnail => "video-thumbnails",
        };
        let url = format!("mem://{}/{}/{}.{}", folder, owner_id, Uuid::new_v4(), extension);
        self.objects.lock().insert(
            url.clone(),
            StoredObject {
                owner_id: owner_id.to_string(),
                kind,
                mime_type: mime_type.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        Ok(url)
    }

    fn upsert_profile_video(&self, owner_id: &str, update: &ProfileVideoUpdate) -> Result<(), PersistError> {
        self.log(GatewayCall::Upsert {
            owner_id: owner_id.to_string(),
        });
        if self.failures.lock().upsert {
            return Err(PersistError("profile update rejected".into()));
        }

        let mut records = self.records.lock();
        let record = records.entry(owner_id.to_string()).or_default();
        record.intro_video_url = Some(update.intro_video_url.clone());
        record.video_thumbnail_url = update.video_thumbnail_url.clone();
        if let Some(at) = update.first_video_uploaded_at {
            record.first_video_uploaded_at = Some(at);
        }
        record.details = Some(update.details.clone());
        Ok(())
    }

    fn delete_profile_video(&self, owner_id: &str) -> Result<(), PersistError> {
        self.log(GatewayCall::Delete {
            owner_id: owner_id.to_string(),
        });
        if self.failures.lock().delete {
            return Err(PersistError("profile update rejected".into()));
        }

        if let Some(record) = self.records.lock().get_mut(owner_id) {
            record.intro_video_url = None;
            record.video_thumbnail_url = None;
            record.first_video_uploaded_at = None;
        }
        Ok(())
    }

    fn read_video_lock_state(&self, owner_id: &str) -> Result<VideoLockState, PersistError> {
        self.log(GatewayCall::Read {
            owner_id: owner_id.to_string(),
        });
        if self.failures.lock().read {
            return Err(PersistError("profile unavailable".into()));
        }

        Ok(self
            .records
            .lock()
            .get(owner_id)
            .map(|record| VideoLockState {
                first_upload_at: record.first_video_uploaded_at,
                intro_video_url: record.intro_video_url.clone(),
                video_thumbnail_url: record.video_thumbnail_url.clone(),
            })
            .unwrap_or_default())
    }

    fn remove_asset(&self, owner_id: &str, kind: AssetKind, url: &str) -> Result<(), PersistError> {
        self.log(GatewayCall::Remove {
            owner_id: owner_id.to_string(),
            kind,
        });
        if self.failures.lock().remove {
            return Err(PersistError("storage unavailable".into()));
        }

        match self.objects.lock().remove(url) {
            Some(_) => Ok(()),
            None => Err(PersistError(format!("no stored object at {}", url))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn update(first: Option<DateTime<Utc>>) -> ProfileVideoUpdate {
        ProfileVideoUpdate {
            intro_video_url: "mem://v".into(),
            video_thumbnail_url: None,
            first_video_uploaded_at: first,
            details: ProfileDetails::new(["Analyst"], "Lisbon"),
        }
    }

    #[test]
    fn upsert_without_timestamp_keeps_the_stored_one() {
        let gateway = InMemoryGateway::new();
        let first = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        gateway.upsert_profile_video("u1", &update(Some(first))).unwrap();
        gateway.upsert_profile_video("u1", &update(None)).unwrap();

        assert_eq!(gateway.record("u1").unwrap().first_video_uploaded_at, Some(first));
        let json = gateway.record_json("u1").unwrap();
        assert!(json.contains("2024-01-02T03:04:05Z"));
    }

    #[test]
    fn uploads_are_stored_and_removable() {
        let gateway = InMemoryGateway::new();
        let url = gateway
            .upload_asset("u1", AssetKind::Video, b"data", "video/webm;codecs=vp9")
            .unwrap();
        assert!(url.starts_with("mem://intro-videos/u1/"));
        assert!(url.ends_with(".webm"));
        assert_eq!(gateway.object(&url).unwrap().bytes, b"data");

        gateway.remove_asset("u1", AssetKind::Video, &url).unwrap();
        assert_eq!(gateway.object_count(), 0);
        assert!(gateway.remove_asset("u1", AssetKind::Video, &url).is_err());
    }

    #[test]
    fn unknown_owner_reads_as_empty() {
        let gateway = InMemoryGateway::new();
        assert_eq!(gateway.read_video_lock_state("nobody").unwrap(), VideoLockState::default());
        assert!(gateway.mutations().is_empty());
    }

    #[test]
    fn injected_failures_surface() {
        let gateway = InMemoryGateway::new();
        gateway.fail_uploads_of(AssetKind::Thumbnail);
        gateway.fail_reads(true);
        assert!(gateway.upload_asset("u1", AssetKind::Thumbnail, b"x", "image/jpeg").is_err());
        assert!(gateway.upload_asset("u1", AssetKind::Video, b"x", "video/mp4").is_ok());
        assert!(gateway.read_video_lock_state("u1").is_err());
    }
}
