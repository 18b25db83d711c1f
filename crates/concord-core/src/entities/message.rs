//! Message entity - a chat message observed on the gateway

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::user::UserData;
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Message entity held in the shared message cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Option<Snowflake>,
    pub guild_id: Option<Snowflake>,
    pub author_id: Option<Snowflake>,
    pub content: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub edited_timestamp: Option<DateTime<Utc>>,
}

/// Partial message payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageData {
    pub id: Option<Snowflake>,
    pub channel_id: Option<Snowflake>,
    pub guild_id: Option<Snowflake>,
    pub author: Option<UserData>,
    pub content: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub edited_timestamp: Option<DateTime<Utc>>,
}

impl Message {
    /// Construct a message from its wire payload
    pub fn from_data(data: &MessageData) -> Result<Self, DomainError> {
        let id = data.id.ok_or(DomainError::MissingIdentity)?;
        let mut message = Self {
            id,
            channel_id: None,
            guild_id: None,
            author_id: None,
            content: None,
            timestamp: None,
            edited_timestamp: None,
        };
        message.apply(data);
        Ok(message)
    }

    /// Merge a later payload (message edits); only present fields overwrite
    pub fn apply(&mut self, data: &MessageData) {
        if let Some(channel_id) = data.channel_id {
            self.channel_id = Some(channel_id);
        }
        if let Some(guild_id) = data.guild_id {
            self.guild_id = Some(guild_id);
        }
        if let Some(author_id) = data.author.as_ref().and_then(UserData::identity) {
            self.author_id = Some(author_id);
        }
        if let Some(content) = &data.content {
            self.content = Some(content.clone());
        }
        if let Some(timestamp) = data.timestamp {
            self.timestamp = Some(timestamp);
        }
        if let Some(edited) = data.edited_timestamp {
            self.edited_timestamp = Some(edited);
        }
    }
}
