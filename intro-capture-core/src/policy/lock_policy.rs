use chrono::{DateTime, Utc};

use crate::models::lock::LockStatus;
use crate::models::profile::VideoLockState;

/// Days after the first save during which deletion is refused.
pub const DEFAULT_LOCK_WINDOW_DAYS: u32 = 20;

/// Compute the lock status of a video first saved at `first_upload_at`.
///
/// `days_elapsed = floor((now - first_upload_at) / 1 day)`; the video is locked
/// while `days_elapsed < window_days`. A timestamp in the future counts as day 0.
pub fn evaluate(first_upload_at: Option<DateTime<Utc>>, now: DateTime<Utc>, window_days: u32) -> LockStatus {
    let Some(first) = first_upload_at else {
        return LockStatus::unlocked();
    };

    let days_elapsed = (now - first).num_days().max(0);
    let remaining = (i64::from(window_days) - days_elapsed).max(0);
    let is_locked = remaining > 0;

    LockStatus {
        is_locked,
        remaining_days: u32::try_from(remaining).unwrap_or(window_days),
        can_delete: !is_locked,
        first_upload_at: Some(first),
    }
}

/// Lock status of a persisted record. A record without a video has nothing to protect.
pub fn evaluate_record(record: &VideoLockState, now: DateTime<Utc>, window_days: u32) -> LockStatus {
    if record.intro_video_url.is_none() {
        return LockStatus::unlocked();
    }
    evaluate(record.first_upload_at, now, window_days)
}

pub fn format_remaining_days(days: u32) -> String {
    match days {
        0 => "No lock period remaining".to_string(),
        1 => "1 day remaining".to_string(),
        n => format!("{} days remaining", n),
    }
}

/// User-facing explanation for a refused delete, `None` when deletion is allowed.
pub fn lock_message(status: &LockStatus) -> Option<String> {
    if status.can_delete {
        return None;
    }
    let unit = if status.remaining_days == 1 { "day" } else { "days" };
    Some(format!(
        "Video cannot be deleted for {} more {}. You can replace it with a new video instead.",
        status.remaining_days, unit
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> Option<DateTime<Utc>> {
        Some(now() - Duration::days(days))
    }

    #[test]
    fn never_uploaded_is_unlocked() {
        assert_eq!(evaluate(None, now(), 20), LockStatus::unlocked());
    }

    #[test]
    fn locked_for_each_day_of_the_window() {
        for elapsed in 0..20 {
            let status = evaluate(days_ago(elapsed), now(), 20);
            assert!(status.is_locked, "day {}", elapsed);
            assert!(!status.can_delete);
            assert_eq!(status.remaining_days, (20 - elapsed) as u32);
        }
    }

    #[test]
    fn unlocks_at_exactly_day_twenty() {
        let status = evaluate(days_ago(20), now(), 20);
        assert!(!status.is_locked);
        assert!(status.can_delete);
        assert_eq!(status.remaining_days, 0);
        assert_eq!(status.first_upload_at, days_ago(20));
    }

    #[test]
    fn partial_days_round_down() {
        let first = now() - Duration::days(19) - Duration::hours(23);
        let status = evaluate(Some(first), now(), 20);
        assert!(status.is_locked);
        assert_eq!(status.remaining_days, 1);
    }

    #[test]
    fn three_days_leaves_seventeen() {
        assert_eq!(evaluate(days_ago(3), now(), 20).remaining_days, 17);
    }

    #[test]
    fn twenty_five_days_is_deletable() {
        let status = evaluate(days_ago(25), now(), 20);
        assert!(status.can_delete);
        assert_eq!(status.remaining_days, 0);
    }

    #[test]
    fn future_timestamp_counts_as_day_zero() {
        let status = evaluate(Some(now() + Duration::days(3)), now(), 20);
        assert!(status.is_locked);
        assert_eq!(status.remaining_days, 20);
    }

    #[test]
    fn record_without_video_is_unlocked() {
        let record = VideoLockState {
            first_upload_at: days_ago(2),
            intro_video_url: None,
            video_thumbnail_url: None,
        };
        assert!(evaluate_record(&record, now(), 20).can_delete);

        let record = VideoLockState {
            intro_video_url: Some("https://cdn/v.webm".into()),
            ..record
        };
        assert_eq!(evaluate_record(&record, now(), 20).remaining_days, 18);
    }

    #[test]
    fn remaining_days_text() {
        assert_eq!(format_remaining_days(0), "No lock period remaining");
        assert_eq!(format_remaining_days(1), "1 day remaining");
        assert_eq!(format_remaining_days(12), "12 days remaining");
    }

    #[test]
    fn lock_message_only_when_locked() {
        assert_eq!(lock_message(&evaluate(days_ago(30), now(), 20)), None);
        assert_eq!(
            lock_message(&evaluate(days_ago(3), now(), 20)).unwrap(),
            "Video cannot be deleted for 17 more days. You can replace it with a new video instead."
        );
    }
}
