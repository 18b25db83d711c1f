//! Channel entity - a text channel, DM, group, voice channel, or category

use serde::Deserialize;

use super::user::UserData;
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Channel type discriminator
///
/// The wire sends a small integer; newer deployments introduce values the
/// client does not know, so an explicit fallback variant keeps them decodable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelType {
    /// Guild text channel
    #[default]
    GuildText,
    /// Direct message between two users
    Dm,
    /// Guild voice channel
    GuildVoice,
    /// Group direct message
    GroupDm,
    /// Guild category for organizing channels
    GuildCategory,
    /// Guild announcement channel
    GuildAnnouncement,
    /// Discriminator value this client does not recognize
    Unknown(u8),
}

impl ChannelType {
    /// Map a raw discriminator to a channel type
    #[must_use]
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            5 => Self::GuildAnnouncement,
            other => Self::Unknown(other),
        }
    }

    /// Get the raw discriminator value
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::GuildText => 0,
            Self::Dm => 1,
            Self::GuildVoice => 2,
            Self::GroupDm => 3,
            Self::GuildCategory => 4,
            Self::GuildAnnouncement => 5,
            Self::Unknown(other) => other,
        }
    }

    /// Check if messages can be sent to this channel type
    #[inline]
    #[must_use]
    pub fn is_messageable(self) -> bool {
        matches!(
            self,
            Self::GuildText | Self::Dm | Self::GroupDm | Self::GuildAnnouncement
        )
    }

    /// Check if this is a direct channel (not inside a guild)
    #[inline]
    #[must_use]
    pub fn is_private(self) -> bool {
        matches!(self, Self::Dm | Self::GroupDm)
    }
}

impl<'de> Deserialize<'de> for ChannelType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Ok(Self::from_u8(value))
    }
}

/// Channel entity held in the shared channel cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: Snowflake,
    pub channel_type: ChannelType,
    pub guild_id: Option<Snowflake>,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub position: Option<i32>,
    pub parent_id: Option<Snowflake>,
    pub last_message_id: Option<Snowflake>,
    /// Recipient user ids (DM and group channels only)
    pub recipient_ids: Vec<Snowflake>,
}

/// Partial channel payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelData {
    pub id: Option<Snowflake>,
    #[serde(rename = "type")]
    pub channel_type: Option<ChannelType>,
    pub guild_id: Option<Snowflake>,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub position: Option<i32>,
    pub parent_id: Option<Snowflake>,
    pub last_message_id: Option<Snowflake>,
    #[serde(default)]
    pub recipients: Vec<UserData>,
    #[serde(default)]
    pub recipient_ids: Vec<Snowflake>,
}

impl Channel {
    /// Construct a channel from its first observed payload
    ///
    /// The type discriminator selects the variant; an unrecognized value
    /// still yields a usable channel tagged `Unknown`.
    pub fn from_data(data: &ChannelData) -> Result<Self, DomainError> {
        let id = data.id.ok_or(DomainError::MissingIdentity)?;
        let mut channel = Self {
            id,
            channel_type: data.channel_type.unwrap_or_default(),
            guild_id: None,
            name: None,
            topic: None,
            position: None,
            parent_id: None,
            last_message_id: None,
            recipient_ids: Vec::new(),
        };
        channel.apply(data);
        Ok(channel)
    }

    /// Merge a later payload; only present fields overwrite
    pub fn apply(&mut self, data: &ChannelData) {
        if let Some(channel_type) = data.channel_type {
            self.channel_type = channel_type;
        }
        if let Some(guild_id) = data.guild_id {
            self.guild_id = Some(guild_id);
        }
        if let Some(name) = &data.name {
            self.name = Some(name.clone());
        }
        if let Some(topic) = &data.topic {
            self.topic = Some(topic.clone());
        }
        if let Some(position) = data.position {
            self.position = Some(position);
        }
        if let Some(parent_id) = data.parent_id {
            self.parent_id = Some(parent_id);
        }
        if let Some(last_message_id) = data.last_message_id {
            self.last_message_id = Some(last_message_id);
        }
        let recipients: Vec<Snowflake> = data
            .recipients
            .iter()
            .filter_map(UserData::identity)
            .chain(data.recipient_ids.iter().copied())
            .collect();
        if !recipients.is_empty() {
            self.recipient_ids = recipients;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_discriminator_fallback() {
        assert_eq!(ChannelType::from_u8(1), ChannelType::Dm);
        assert_eq!(ChannelType::from_u8(42), ChannelType::Unknown(42));
        assert_eq!(ChannelType::Unknown(42).as_u8(), 42);
    }

    #[test]
    fn test_unknown_type_still_decodes() {
        let data: ChannelData = serde_json::from_str(r#"{"id": "3", "type": 99}"#).unwrap();
        let channel = Channel::from_data(&data).unwrap();
        assert_eq!(channel.channel_type, ChannelType::Unknown(99));
        assert!(!channel.channel_type.is_messageable());
    }

    #[test]
    fn test_dm_recipients() {
        let data: ChannelData = serde_json::from_str(
            r#"{"id": "3", "type": 1, "recipients": [{"id": "8", "username": "kit"}]}"#,
        )
        .unwrap();
        let channel = Channel::from_data(&data).unwrap();
        assert!(channel.channel_type.is_private());
        assert_eq!(channel.recipient_ids, vec![Snowflake::new(8)]);
    }
}
