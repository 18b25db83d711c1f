//! Bootstrap payload structures
//!
//! The initial snapshot arrives split across two dispatch events. The
//! primary payload carries top-level arrays; the supplemental payload
//! carries lightweight guild fragments and per-guild member/presence batches
//! that correlate to the primary payload by array position, not by id.

use concord_core::{ChannelData, GuildData, MemberData, PresenceData, RelationshipData, UserData};
use serde::Deserialize;

/// Primary bootstrap payload (READY)
///
/// The four top-level arrays are not index-aligned with each other; any of
/// them may be shorter than the others.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadyPayload {
    /// Gateway protocol version echo
    pub v: Option<u8>,
    pub session_id: Option<String>,
    pub resume_gateway_url: Option<String>,
    /// The account's own user
    pub user: Option<UserData>,
    #[serde(default)]
    pub guilds: Vec<GuildData>,
    #[serde(default)]
    pub private_channels: Vec<ChannelData>,
    #[serde(default)]
    pub users: Vec<UserData>,
    #[serde(default)]
    pub relationships: Vec<RelationshipData>,
    /// Per-guild member batches, index-aligned with `guilds`
    #[serde(default)]
    pub merged_members: Vec<Vec<MemberData>>,
}

impl ReadyPayload {
    /// Length of the longest top-level array; the iteration bound for the
    /// position-zipped reconciliation pass
    #[must_use]
    pub fn longest_len(&self) -> usize {
        self.guilds
            .len()
            .max(self.private_channels.len())
            .max(self.users.len())
            .max(self.relationships.len())
    }
}

/// Deferred bootstrap payload (READY_SUPPLEMENTAL)
///
/// `guilds[i]` and `merged_members[i]` describe the same guild as the
/// primary payload's `guilds[i]`; the fragments may omit the id needed for
/// direct lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadySupplementalPayload {
    #[serde(default)]
    pub guilds: Vec<GuildData>,
    #[serde(default)]
    pub merged_members: Vec<Vec<MemberData>>,
    #[serde(default)]
    pub merged_presences: MergedPresences,
}

/// Presence batches inside the supplemental payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergedPresences {
    /// Per-guild presence batches, index-aligned with the guild arrays
    #[serde(default)]
    pub guilds: Vec<Vec<PresenceData>>,
    /// Presences of the account's friends
    #[serde(default)]
    pub friends: Vec<PresenceData>,
}
