//! Client payload definitions
//!
//! Structures for the payloads this client sends, plus the HELLO data it
//! receives. The identify block is serialized verbatim: its values are
//! policy supplied by configuration, not protocol.

use std::collections::HashMap;

use concord_common::IdentityConfig;
use concord_core::{Capabilities, Snowflake};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of op 10 (Hello)
///
/// Received immediately after the socket opens.
#[derive(Debug, Clone, Deserialize)]
pub struct HelloData {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// Payload for op 2 (Identify)
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyPayload {
    pub token: String,
    pub capabilities: Capabilities,
    pub properties: ClientProperties,
    pub presence: PresencePayload,
    pub compress: bool,
    pub client_state: ClientState,
}

/// Client identity block inside Identify
#[derive(Debug, Clone, Serialize)]
pub struct ClientProperties {
    pub os: String,
    pub browser: String,
    pub client_version: String,
    pub client_build_number: u32,
    pub release_channel: String,
    #[serde(rename = "system-locale")]
    pub system_locale: String,
}

impl From<&IdentityConfig> for ClientProperties {
    fn from(identity: &IdentityConfig) -> Self {
        Self {
            os: identity.os.clone(),
            browser: identity.browser.clone(),
            client_version: identity.client_version.clone(),
            client_build_number: identity.client_build_number,
            release_channel: identity.release_channel.clone(),
            system_locale: identity.locale.clone(),
        }
    }
}

/// Versioned client state block inside Identify
///
/// A fresh session declares zeroed versions; the server responds with full
/// snapshots rather than deltas.
#[derive(Debug, Clone, Serialize)]
pub struct ClientState {
    pub guild_versions: HashMap<String, String>,
    pub api_code_version: u8,
    pub highest_last_message_id: String,
    pub private_channels_version: String,
    pub read_state_version: u64,
    pub user_guild_settings_version: i64,
    pub user_settings_version: i64,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            guild_versions: HashMap::new(),
            api_code_version: 0,
            highest_last_message_id: "0".to_string(),
            private_channels_version: "0".to_string(),
            read_state_version: 0,
            user_guild_settings_version: -1,
            user_settings_version: -1,
        }
    }
}

/// Presence block for Identify and op 3 (Presence Update)
#[derive(Debug, Clone, Serialize)]
pub struct PresencePayload {
    pub status: String,
    pub since: u64,
    pub activities: Vec<Value>,
    pub afk: bool,
}

impl PresencePayload {
    /// Valid status values
    pub const VALID_STATUSES: &'static [&'static str] = &["online", "idle", "dnd", "invisible"];

    /// Create a presence payload with the given status
    #[must_use]
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            since: 0,
            activities: Vec::new(),
            afk: false,
        }
    }

    /// Check if the status is one the gateway accepts
    #[must_use]
    pub fn is_valid_status(&self) -> bool {
        Self::VALID_STATUSES.contains(&self.status.as_str())
    }
}

impl Default for PresencePayload {
    fn default() -> Self {
        Self::with_status("online")
    }
}

/// Payload for op 6 (Resume)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePayload {
    pub token: String,
    pub session_id: String,
    pub seq: u64,
}

/// Payload for op 8 (RequestMembers) - legacy guild-wide ranges
#[derive(Debug, Clone, Serialize)]
pub struct MemberRangesPayload {
    pub guild_id: Snowflake,
    pub ranges: Vec<[u64; 2]>,
}

/// Payload for op 14 (GuildSubscriptions) - channel-scoped ranges
#[derive(Debug, Clone, Serialize)]
pub struct ChannelRangesPayload {
    pub guild_id: Snowflake,
    pub channels: HashMap<Snowflake, Vec<[u64; 2]>>,
}

impl ChannelRangesPayload {
    /// Subscribe one channel to the given member ranges
    #[must_use]
    pub fn single(guild_id: Snowflake, channel_id: Snowflake, ranges: Vec<[u64; 2]>) -> Self {
        let mut channels = HashMap::new();
        channels.insert(channel_id, ranges);
        Self { guild_id, channels }
    }
}
