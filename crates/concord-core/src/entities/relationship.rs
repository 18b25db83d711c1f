//! Relationship entity - friend, block, or pending request

use serde::Deserialize;

use super::user::UserData;
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Relationship type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipType {
    /// Mutual friendship
    Friend,
    /// The account has blocked this user
    Blocked,
    /// Incoming friend request
    IncomingRequest,
    /// Outgoing friend request
    OutgoingRequest,
    /// Discriminator value this client does not recognize
    Unknown(u8),
}

impl RelationshipType {
    /// Map a raw discriminator to a relationship type
    #[must_use]
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Friend,
            2 => Self::Blocked,
            3 => Self::IncomingRequest,
            4 => Self::OutgoingRequest,
            other => Self::Unknown(other),
        }
    }
}

impl<'de> Deserialize<'de> for RelationshipType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Ok(Self::from_u8(value))
    }
}

/// Relationship entity
///
/// The `id` of a relationship payload IS the other user's id; the embedded
/// user object (when present) carries their profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub user_id: Snowflake,
    pub kind: RelationshipType,
    pub nickname: Option<String>,
}

/// Relationship payload as sent in the bootstrap `relationships[]` array
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationshipData {
    pub id: Option<Snowflake>,
    #[serde(rename = "type")]
    pub kind: Option<u8>,
    pub nickname: Option<String>,
    pub user: Option<UserData>,
}

impl RelationshipData {
    /// The user this relationship points at
    pub fn identity(&self) -> Option<Snowflake> {
        self.id
            .or_else(|| self.user.as_ref().and_then(UserData::identity))
    }

    /// View of this relationship as a user patch for the shared user cache
    pub fn as_user_data(&self) -> UserData {
        let mut data = self.user.clone().unwrap_or_default();
        if data.id.is_none() {
            data.id = self.id;
        }
        data
    }
}

impl Relationship {
    /// Construct a relationship from its wire payload
    pub fn from_data(data: &RelationshipData) -> Result<Self, DomainError> {
        let user_id = data.identity().ok_or(DomainError::MissingIdentity)?;
        Ok(Self {
            user_id,
            kind: RelationshipType::from_u8(data.kind.unwrap_or(0)),
            nickname: data.nickname.clone(),
        })
    }
}
