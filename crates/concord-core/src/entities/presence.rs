//! Presence payload - a user's observed online status

use serde::Deserialize;
use serde_json::Value;

use super::user::UserData;
use crate::value_objects::Snowflake;

/// Presence payload as sent in merged-presence batches and live updates
///
/// Presences are not cached as their own entity; they merge into the shared
/// user cache via `as_user_data`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresenceData {
    pub user_id: Option<Snowflake>,
    pub user: Option<UserData>,
    pub status: Option<String>,
    #[serde(default)]
    pub activities: Vec<Value>,
}

impl PresenceData {
    /// The user this presence belongs to
    pub fn identity(&self) -> Option<Snowflake> {
        self.user_id
            .or_else(|| self.user.as_ref().and_then(UserData::identity))
    }

    /// View of this presence as a user patch for the shared user cache
    pub fn as_user_data(&self) -> UserData {
        let mut data = self.user.clone().unwrap_or_default();
        if data.id.is_none() {
            data.id = self.user_id;
        }
        if data.status.is_none() {
            data.status = self.status.clone();
        }
        data
    }
}
