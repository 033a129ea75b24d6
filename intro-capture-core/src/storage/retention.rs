use chrono::{DateTime, Utc};

use crate::models::error::CaptureError;
use crate::models::lock::LockStatus;
use crate::models::profile::AssetKind;
use crate::policy::lock_policy::{evaluate_record, format_remaining_days};
use crate::traits::persistence::PersistenceGateway;

/// Lock status derived from a fresh read of the owner's record.
pub fn lock_status(
    gateway: &dyn PersistenceGateway,
    owner_id: &str,
    now: DateTime<Utc>,
    window_days: u32,
) -> Result<LockStatus, CaptureError> {
    let record = gateway.read_video_lock_state(owner_id)?;
    Ok(evaluate_record(&record, now, window_days))
}

/// Delete the owner's intro video if the lock window has passed.
///
/// A locked video is refused before any destructive gateway call. After a
/// permitted delete the stored video and thumbnail are removed; failing that
/// is only logged.
pub fn delete_profile_video(
    gateway: &dyn PersistenceGateway,
    owner_id: &str,
    now: DateTime<Utc>,
    window_days: u32,
) -> Result<LockStatus, CaptureError> {
    let record = gateway.read_video_lock_state(owner_id)?;
    let status = evaluate_record(&record, now, window_days);
    if !status.can_delete {
        log::warn!(
            "Refusing to delete intro video of {}: {}",
            owner_id,
            format_remaining_days(status.remaining_days)
        );
        return Err(CaptureError::LockViolation {
            remaining_days: status.remaining_days,
        });
    }

    gateway.delete_profile_video(owner_id)?;
    log::info!("Deleted intro video of {}", owner_id);

    let stored = [
        (AssetKind::Video, record.intro_video_url.as_deref()),
        (AssetKind::Thumbnail, record.video_thumbnail_url.as_deref()),
    ];
    for (kind, url) in stored {
        let Some(url) = url else { continue };
        if let Err(e) = gateway.remove_asset(owner_id, kind, url) {
            log::warn!("Failed to remove stored {:?} {}: {}", kind, url, e);
        }
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::VideoLockState;
    use crate::storage::fake_gateway::FakeGateway;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()
    }

    fn gateway(days_ago: i64) -> FakeGateway {
        FakeGateway::with_record(VideoLockState {
            first_upload_at: Some(now() - Duration::days(days_ago)),
            intro_video_url: Some("https://cdn.test/video".into()),
            video_thumbnail_url: Some("https://cdn.test/thumb".into()),
        })
    }

    #[test]
    fn locked_video_is_refused_before_delete() {
        let gateway = gateway(3);
        let err = delete_profile_video(&gateway, "u1", now(), 20).unwrap_err();

        assert_eq!(err, CaptureError::LockViolation { remaining_days: 17 });
        assert!(err.to_string().contains("17 more days"));
        assert_eq!(gateway.calls(), vec!["read"]);
    }

    #[test]
    fn expired_lock_deletes_and_clears_first_upload() {
        let gateway = gateway(25);
        let status = delete_profile_video(&gateway, "u1", now(), 20).unwrap();

        assert!(status.can_delete);
        assert_eq!(status.remaining_days, 0);
        assert_eq!(
            gateway.calls(),
            vec!["read", "delete", "remove:Video", "remove:Thumbnail"]
        );
        assert_eq!(*gateway.record.lock(), VideoLockState::default());
    }

    #[test]
    fn delete_without_thumbnail_removes_only_the_video() {
        let gateway = FakeGateway::with_record(VideoLockState {
            first_upload_at: Some(now() - Duration::days(30)),
            intro_video_url: Some("https://cdn.test/video".into()),
            video_thumbnail_url: None,
        });
        delete_profile_video(&gateway, "u1", now(), 20).unwrap();
        assert_eq!(gateway.calls(), vec!["read", "delete", "remove:Video"]);
    }

    #[test]
    fn lock_status_reads_fresh_state() {
        let gateway = gateway(1);
        assert_eq!(lock_status(&gateway, "u1", now(), 20).unwrap().remaining_days, 19);
    }
}
