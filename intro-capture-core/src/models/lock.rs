use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a saved intro video may currently be deleted.
///
/// A projection of the persisted first-upload timestamp; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStatus {
    pub is_locked: bool,
    pub remaining_days: u32,
    pub can_delete: bool,
    pub first_upload_at: Option<DateTime<Utc>>,
}

impl LockStatus {
    pub fn unlocked() -> Self {
        Self {
            is_locked: false,
            remaining_days: 0,
            can_delete: true,
            first_upload_at: None,
        }
    }
}
