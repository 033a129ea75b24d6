use chrono::{DateTime, Utc};

use crate::models::error::CaptureError;
use crate::models::media::MediaAsset;
use crate::models::profile::{AssetKind, ProfileDetails, ProfileVideoUpdate, SavedVideo};
use crate::traits::persistence::PersistenceGateway;

/// Upload `asset` and record it on the owner's profile.
///
/// The first-upload timestamp is sent only when the profile has never had
/// one, so replacing a video keeps its original lock window. A failed
/// thumbnail upload is logged and the record is saved without one.
pub fn publish(
    gateway: &dyn PersistenceGateway,
    owner_id: &str,
    asset: &MediaAsset,
    details: &ProfileDetails,
    now: DateTime<Utc>,
) -> Result<SavedVideo, CaptureError> {
    let details = details.normalized().map_err(CaptureError::InvalidDetails)?;
    let existing = gateway.read_video_lock_state(owner_id)?;

    let video_url = gateway.upload_asset(owner_id, AssetKind::Video, &asset.file.bytes, &asset.file.mime_type)?;
    log::info!("Uploaded {} ({} bytes) for {}", asset.file.name, asset.size_bytes, owner_id);

    let thumbnail_url = asset.thumbnail.as_ref().and_then(|thumbnail| {
        match gateway.upload_asset(owner_id, AssetKind::Thumbnail, &thumbnail.bytes, &thumbnail.mime_type) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Thumbnail upload failed for {}: {}; saving without thumbnail", owner_id, e);
                None
            }
        }
    });

    let first_video_uploaded_at = match existing.first_upload_at {
        Some(_) => None,
        None => Some(now),
    };
    let update = ProfileVideoUpdate {
        intro_video_url: video_url.clone(),
        video_thumbnail_url: thumbnail_url.clone(),
        first_video_uploaded_at,
        details,
    };

    if let Err(e) = gateway.upsert_profile_video(owner_id, &update) {
        log::error!("Failed to update profile of {}: {}", owner_id, e);
        discard_upload(gateway, owner_id, AssetKind::Video, &video_url);
        if let Some(url) = thumbnail_url.as_deref() {
            discard_upload(gateway, owner_id, AssetKind::Thumbnail, url);
        }
        return Err(e.into());
    }

    Ok(SavedVideo {
        asset: asset.clone(),
        video_url,
        thumbnail_url,
        first_upload_at: existing.first_upload_at.or(first_video_uploaded_at),
    })
}

fn discard_upload(gateway: &dyn PersistenceGateway, owner_id: &str, kind: AssetKind, url: &str) {
    if let Err(e) = gateway.remove_asset(owner_id, kind, url) {
        log::warn!("Failed to remove orphaned upload {}: {}", url, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::{AssetSource, MediaFile, Thumbnail};
    use crate::models::profile::VideoLockState;
    use crate::storage::fake_gateway::FakeGateway;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()
    }

    fn asset() -> MediaAsset {
        let thumbnail = Thumbnail {
            mime_type: "image/jpeg".into(),
            width: 320,
            height: 180,
            bytes: vec![0xFF, 0xD8, 0xFF],
        };
        MediaAsset::new(
            MediaFile::new("intro.webm", "video/webm", vec![5; 64]),
            14.0,
            Some(thumbnail),
            AssetSource::Recorded,
            false,
        )
    }

    fn details() -> ProfileDetails {
        ProfileDetails::new(["Backend Engineer"], "Berlin")
    }

    #[test]
    fn first_save_sets_first_upload() {
        let gateway = FakeGateway::default();
        let saved = publish(&gateway, "u1", &asset(), &details(), now()).unwrap();

        assert_eq!(saved.first_upload_at, Some(now()));
        assert!(saved.thumbnail_url.is_some());
        assert_eq!(gateway.calls(), vec!["read", "upload:Video", "upload:Thumbnail", "upsert"]);
        assert_eq!(gateway.upserts.lock()[0].first_video_uploaded_at, Some(now()));
    }

    #[test]
    fn replacing_keeps_original_first_upload() {
        let first = now() - Duration::days(4);
        let gateway = FakeGateway::with_record(VideoLockState {
            first_upload_at: Some(first),
            intro_video_url: Some("https://cdn.test/old".into()),
            video_thumbnail_url: None,
        });

        let saved = publish(&gateway, "u1", &asset(), &details(), now()).unwrap();
        assert_eq!(saved.first_upload_at, Some(first));
        assert_eq!(gateway.upserts.lock()[0].first_video_uploaded_at, None);
        assert_eq!(gateway.record.lock().first_upload_at, Some(first));
    }

    #[test]
    fn thumbnail_upload_failure_is_not_fatal() {
        let gateway = FakeGateway {
            fail_thumbnail_upload: true,
            ..FakeGateway::default()
        };
        let saved = publish(&gateway, "u1", &asset(), &details(), now()).unwrap();
        assert_eq!(saved.thumbnail_url, None);
        assert_eq!(gateway.upserts.lock()[0].video_thumbnail_url, None);
    }

    #[test]
    fn invalid_details_make_no_gateway_calls() {
        let gateway = FakeGateway::default();
        let bad = ProfileDetails::new(["Engineer"], "");
        let err = publish(&gateway, "u1", &asset(), &bad, now()).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidDetails(_)));
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn failed_upsert_removes_uploads() {
        let gateway = FakeGateway {
            fail_upsert: true,
            ..FakeGateway::default()
        };
        let err = publish(&gateway, "u1", &asset(), &details(), now()).unwrap_err();
        assert!(matches!(err, CaptureError::Persist(_)));
        assert_eq!(
            gateway.calls(),
            vec!["read", "upload:Video", "upload:Thumbnail", "upsert", "remove:Video", "remove:Thumbnail"]
        );
    }
}
