//! Guild entity - a server the account belongs to

use serde::Deserialize;

use super::channel::ChannelData;
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Guild entity held in the shared guild cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: Snowflake,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub owner_id: Option<Snowflake>,
    pub member_count: Option<u64>,
    pub unavailable: bool,
}

/// Partial guild payload
///
/// The bootstrap supplemental sends lightweight fragments of these; live
/// guild events send fuller versions with embedded channels.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuildData {
    pub id: Option<Snowflake>,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub owner_id: Option<Snowflake>,
    pub member_count: Option<u64>,
    pub unavailable: Option<bool>,
    #[serde(default)]
    pub channels: Vec<ChannelData>,
}

impl Guild {
    /// Construct a guild from its first observed fragment
    pub fn from_data(data: &GuildData) -> Result<Self, DomainError> {
        let id = data.id.ok_or(DomainError::MissingIdentity)?;
        let mut guild = Self {
            id,
            name: None,
            icon: None,
            description: None,
            owner_id: None,
            member_count: None,
            unavailable: false,
        };
        guild.apply(data);
        Ok(guild)
    }

    /// Merge a later fragment; only present fields overwrite
    pub fn apply(&mut self, data: &GuildData) {
        if let Some(name) = &data.name {
            self.name = Some(name.clone());
        }
        if let Some(icon) = &data.icon {
            self.icon = Some(icon.clone());
        }
        if let Some(description) = &data.description {
            self.description = Some(description.clone());
        }
        if let Some(owner_id) = data.owner_id {
            self.owner_id = Some(owner_id);
        }
        if let Some(member_count) = data.member_count {
            self.member_count = Some(member_count);
        }
        if let Some(unavailable) = data.unavailable {
            self.unavailable = unavailable;
        }
    }

    /// Check if a user owns this guild
    #[inline]
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_merge() {
        let first = GuildData {
            id: Some(Snowflake::new(7)),
            name: Some("rust hideout".to_string()),
            ..GuildData::default()
        };
        let mut guild = Guild::from_data(&first).unwrap();

        let fragment = GuildData {
            id: Some(Snowflake::new(7)),
            member_count: Some(314),
            ..GuildData::default()
        };
        guild.apply(&fragment);

        assert_eq!(guild.name.as_deref(), Some("rust hideout"));
        assert_eq!(guild.member_count, Some(314));
    }
}
