//! Entity cache trait (port) - the storage collaborator of the gateway core
//!
//! The gateway never touches storage directly; it produces merge operations
//! against this interface and the surrounding system implements it however it
//! likes (in-process map, database, ...).
//!
//! Every mutating operation is required to be a single atomic
//! check-existence-then-insert-or-merge: re-applying the same payload must
//! never create a duplicate identity, even under concurrent dispatch.

use async_trait::async_trait;

use crate::entities::{
    Channel, ChannelData, Guild, GuildData, GuildMember, MemberData, Message, Relationship,
    RelationshipData, User, UserData,
};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, DomainError>;

#[async_trait]
pub trait EntityCache: Send + Sync {
    /// Find a cached user by id
    async fn lookup_user(&self, id: Snowflake) -> Option<User>;

    /// Insert a user or merge a partial patch into the existing entry
    ///
    /// Returns the merged entity. Fails with `MissingIdentity` when the patch
    /// carries no id.
    async fn upsert_user(&self, data: &UserData) -> CacheResult<User>;

    /// Find a cached guild by id
    async fn lookup_guild(&self, id: Snowflake) -> Option<Guild>;

    /// Register a guild or merge a partial fragment into the existing entry
    async fn register_guild(&self, data: &GuildData) -> CacheResult<Guild>;

    /// Drop a guild and its member table
    async fn remove_guild(&self, id: Snowflake) -> Option<Guild>;

    /// Attach a member to a guild, reusing the identity if already attached
    async fn attach_member(
        &self,
        guild_id: Snowflake,
        data: &MemberData,
    ) -> CacheResult<GuildMember>;

    /// All members currently attached to a guild
    async fn guild_members(&self, guild_id: Snowflake) -> Vec<GuildMember>;

    /// Find a cached channel by id
    async fn lookup_channel(&self, id: Snowflake) -> Option<Channel>;

    /// Insert a channel or merge a partial patch into the existing entry
    async fn upsert_channel(&self, data: &ChannelData) -> CacheResult<Channel>;

    /// Drop a channel
    async fn remove_channel(&self, id: Snowflake) -> Option<Channel>;

    /// Find a cached message by id
    async fn lookup_message(&self, id: Snowflake) -> Option<Message>;

    /// Cache a message
    async fn insert_message(&self, message: Message);

    /// Record a relationship, updating the friend/blocked lists exactly once
    async fn record_relationship(&self, data: &RelationshipData) -> CacheResult<Relationship>;

    /// User ids of all friends
    async fn friends(&self) -> Vec<Snowflake>;

    /// User ids of all blocked users
    async fn blocked(&self) -> Vec<Snowflake>;
}
