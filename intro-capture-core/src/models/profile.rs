use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::MediaAsset;

const MAX_ROLES: usize = 7;
const MAX_ROLE_CHARS: usize = 50;
const MAX_LOCATION_CHARS: usize = 100;

/// Kind of binary object stored through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Video,
    Thumbnail,
}

/// Lock-relevant slice of the persisted profile record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoLockState {
    pub first_upload_at: Option<DateTime<Utc>>,
    pub intro_video_url: Option<String>,
    pub video_thumbnail_url: Option<String>,
}

/// Metadata the user supplies when saving an intro video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDetails {
    pub desired_roles: Vec<String>,
    pub desired_location: String,
}

impl ProfileDetails {
    pub fn new<I, S>(roles: I, location: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            desired_roles: roles.into_iter().map(Into::into).collect(),
            desired_location: location.into(),
        }
    }

    /// Trim and check the details, returning the cleaned copy.
    pub fn normalized(&self) -> Result<Self, String> {
        let mut roles: Vec<String> = Vec::with_capacity(self.desired_roles.len());
        for role in &self.desired_roles {
            let role = role.trim();
            if role.is_empty() {
                return Err("role names cannot be empty".into());
            }
            if role.chars().count() > MAX_ROLE_CHARS {
                return Err(format!("role name cannot exceed {} characters", MAX_ROLE_CHARS));
            }
            if roles.iter().any(|r| r == role) {
                return Err(format!("role '{}' is already added", role));
            }
            roles.push(role.to_string());
        }
        if roles.is_empty() {
            return Err("desired roles and location are mandatory".into());
        }
        if roles.len() > MAX_ROLES {
            return Err(format!("at most {} roles can be added", MAX_ROLES));
        }

        let location = self.desired_location.trim();
        if location.is_empty() {
            return Err("desired roles and location are mandatory".into());
        }
        if location.chars().count() > MAX_LOCATION_CHARS {
            return Err(format!("location cannot exceed {} characters", MAX_LOCATION_CHARS));
        }

        Ok(Self {
            desired_roles: roles,
            desired_location: location.to_string(),
        })
    }
}

/// Upsert payload for the profile record.
///
/// `first_video_uploaded_at` is `Some` only on the very first save for an
/// owner; the gateway must leave the stored value untouched when it is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileVideoUpdate {
    pub intro_video_url: String,
    pub video_thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_video_uploaded_at: Option<DateTime<Utc>>,
    pub details: ProfileDetails,
}

/// A video that has been uploaded and recorded on the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedVideo {
    pub asset: MediaAsset,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub first_upload_at: Option<DateTime<Utc>>,
}
