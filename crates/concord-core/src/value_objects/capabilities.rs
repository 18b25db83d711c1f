//! Client capability bitmask declared during IDENTIFY
//!
//! The gateway tailors the bootstrap payload shape to the capabilities the
//! client declares. The bits below select the lean, deduplicated bootstrap
//! format that the reconciler expects.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Capability flags sent in the IDENTIFY payload
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u64 {
        /// Defer user note delivery until requested
        const LAZY_USER_NOTES              = 1 << 0;
        /// Omit per-user affinity scores from the bootstrap payload
        const NO_AFFINE_USER_IDS           = 1 << 1;
        /// Version read-state deltas instead of full snapshots
        const VERSIONED_READ_STATES        = 1 << 2;
        /// Version user guild settings deltas
        const VERSIONED_USER_GUILD_SETTINGS = 1 << 3;
        /// Deduplicate user objects across bootstrap arrays
        const DEDUPE_USER_OBJECTS          = 1 << 4;
        /// Split bootstrap into primary + supplemental payloads
        const PRIORITIZED_READY_PAYLOAD    = 1 << 5;
        /// Accept multiple experiment populations per guild
        const MULTIPLE_GUILD_EXPERIMENT_POPULATIONS = 1 << 6;
        /// Deliver read states for non-channel resources
        const NON_CHANNEL_READ_STATES      = 1 << 7;
        /// Accept in-band auth token refresh events
        const AUTH_TOKEN_REFRESH           = 1 << 8;
        /// Accept guild updates as passive deltas
        const PASSIVE_GUILD_UPDATE         = 1 << 9;

        /// Default capability set for this client
        const DEFAULT = Self::NO_AFFINE_USER_IDS.bits()
            | Self::VERSIONED_READ_STATES.bits()
            | Self::VERSIONED_USER_GUILD_SETTINGS.bits()
            | Self::DEDUPE_USER_OBJECTS.bits()
            | Self::PRIORITIZED_READY_PAYLOAD.bits();
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// Serialized as the raw integer the wire expects
impl Serialize for Capabilities {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.bits())
    }
}

impl<'de> Deserialize<'de> for Capabilities {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}
