//! In-memory entity cache
//!
//! Backed by `DashMap` so dispatch handlers and the reconciler can mutate
//! concurrently. Each upsert holds the map entry for the whole
//! check-then-insert-or-merge, which is what makes re-applying the same
//! bootstrap payload safe: an identity is only ever created once.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use concord_core::{
    CacheResult, Channel, ChannelData, DomainError, EntityCache, Guild, GuildData, GuildMember,
    MemberData, Message, Relationship, RelationshipData, RelationshipType, Snowflake, User,
    UserData,
};

/// Session-scoped in-memory entity cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    users: DashMap<Snowflake, User>,
    guilds: DashMap<Snowflake, Guild>,
    /// guild id -> user id -> membership
    members: DashMap<Snowflake, HashMap<Snowflake, GuildMember>>,
    channels: DashMap<Snowflake, Channel>,
    messages: DashMap<Snowflake, Message>,
    relationships: DashMap<Snowflake, Relationship>,
}

impl MemoryCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached users
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of cached guilds
    pub fn guild_count(&self) -> usize {
        self.guilds.len()
    }

    /// Number of members attached to a guild
    pub fn member_count(&self, guild_id: Snowflake) -> usize {
        self.members.get(&guild_id).map_or(0, |table| table.len())
    }
}

#[async_trait]
impl EntityCache for MemoryCache {
    async fn lookup_user(&self, id: Snowflake) -> Option<User> {
        self.users.get(&id).map(|user| user.clone())
    }

    async fn upsert_user(&self, data: &UserData) -> CacheResult<User> {
        let id = data.identity().ok_or(DomainError::MissingIdentity)?;
        let user = match self.users.entry(id) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().apply(data);
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => vacant.insert(User::from_data(data)?).clone(),
        };
        Ok(user)
    }

    async fn lookup_guild(&self, id: Snowflake) -> Option<Guild> {
        self.guilds.get(&id).map(|guild| guild.clone())
    }

    async fn register_guild(&self, data: &GuildData) -> CacheResult<Guild> {
        let id = data.id.ok_or(DomainError::MissingIdentity)?;
        let guild = match self.guilds.entry(id) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().apply(data);
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => vacant.insert(Guild::from_data(data)?).clone(),
        };

        // Guild payloads may embed their channel list
        for channel in &data.channels {
            let mut channel = channel.clone();
            if channel.guild_id.is_none() {
                channel.guild_id = Some(id);
            }
            if let Err(error) = self.upsert_channel(&channel).await {
                tracing::debug!(guild_id = %id, %error, "Skipping embedded channel");
            }
        }

        Ok(guild)
    }

    async fn remove_guild(&self, id: Snowflake) -> Option<Guild> {
        self.members.remove(&id);
        self.guilds.remove(&id).map(|(_, guild)| guild)
    }

    async fn attach_member(
        &self,
        guild_id: Snowflake,
        data: &MemberData,
    ) -> CacheResult<GuildMember> {
        let user_id = data.identity().ok_or(DomainError::MissingIdentity)?;
        let mut table = self.members.entry(guild_id).or_default();
        let member = match table.get_mut(&user_id) {
            Some(existing) => {
                existing.apply(data);
                existing.clone()
            }
            None => {
                let member = GuildMember::from_data(guild_id, data)?;
                table.insert(user_id, member.clone());
                member
            }
        };
        Ok(member)
    }

    async fn guild_members(&self, guild_id: Snowflake) -> Vec<GuildMember> {
        self.members
            .get(&guild_id)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default()
    }

    async fn lookup_channel(&self, id: Snowflake) -> Option<Channel> {
        self.channels.get(&id).map(|channel| channel.clone())
    }

    async fn upsert_channel(&self, data: &ChannelData) -> CacheResult<Channel> {
        let id = data.id.ok_or(DomainError::MissingIdentity)?;
        let channel = match self.channels.entry(id) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().apply(data);
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => vacant.insert(Channel::from_data(data)?).clone(),
        };
        Ok(channel)
    }

    async fn remove_channel(&self, id: Snowflake) -> Option<Channel> {
        self.channels.remove(&id).map(|(_, channel)| channel)
    }

    async fn lookup_message(&self, id: Snowflake) -> Option<Message> {
        self.messages.get(&id).map(|message| message.clone())
    }

    async fn insert_message(&self, message: Message) {
        self.messages.insert(message.id, message);
    }

    async fn record_relationship(&self, data: &RelationshipData) -> CacheResult<Relationship> {
        let user_id = data.identity().ok_or(DomainError::MissingIdentity)?;
        let relationship = match self.relationships.entry(user_id) {
            Entry::Occupied(mut occupied) => {
                // Relationship type changes replace the previous entry
                let updated = Relationship::from_data(data)?;
                *occupied.get_mut() = updated;
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => vacant.insert(Relationship::from_data(data)?).clone(),
        };
        Ok(relationship)
    }

    async fn friends(&self) -> Vec<Snowflake> {
        self.relationships
            .iter()
            .filter(|entry| entry.kind == RelationshipType::Friend)
            .map(|entry| entry.user_id)
            .collect()
    }

    async fn blocked(&self) -> Vec<Snowflake> {
        self.relationships
            .iter()
            .filter(|entry| entry.kind == RelationshipType::Blocked)
            .map(|entry| entry.user_id)
            .collect()
    }
}
