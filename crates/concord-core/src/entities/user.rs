//! User entity - any account the client has seen (friend, guild member, author)

use serde::Deserialize;

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// User entity held in the shared user cache
///
/// A single identity per account: a user who is both a cached friend and a
/// guild member resolves to the same entry, updated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Snowflake,
    pub username: Option<String>,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub accent_color: Option<u32>,
    pub public_flags: Option<u64>,
    pub bot: bool,
    pub system: bool,
    /// Last observed presence status (online, idle, dnd, offline)
    pub status: Option<String>,
}

/// Partial user payload as the gateway sends it
///
/// Appears under several spellings: top-level `users[]` entries carry `id`,
/// presence and member fragments carry `user_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserData {
    #[serde(alias = "user_id")]
    pub id: Option<Snowflake>,
    pub username: Option<String>,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub accent_color: Option<u32>,
    pub public_flags: Option<u64>,
    pub bot: Option<bool>,
    pub system: Option<bool>,
    pub status: Option<String>,
}

impl UserData {
    /// The identity this patch refers to, if it carries one
    #[inline]
    pub fn identity(&self) -> Option<Snowflake> {
        self.id
    }
}

impl User {
    /// Construct a user from its first observed patch
    pub fn from_data(data: &UserData) -> Result<Self, DomainError> {
        let id = data.identity().ok_or(DomainError::MissingIdentity)?;
        let mut user = Self {
            id,
            username: None,
            discriminator: None,
            avatar: None,
            banner: None,
            accent_color: None,
            public_flags: None,
            bot: false,
            system: false,
            status: None,
        };
        user.apply(data);
        Ok(user)
    }

    /// Merge a later patch; only present fields overwrite
    pub fn apply(&mut self, data: &UserData) {
        if let Some(username) = &data.username {
            self.username = Some(username.clone());
        }
        if let Some(discriminator) = &data.discriminator {
            self.discriminator = Some(discriminator.clone());
        }
        if let Some(avatar) = &data.avatar {
            self.avatar = Some(avatar.clone());
        }
        if let Some(banner) = &data.banner {
            self.banner = Some(banner.clone());
        }
        if let Some(accent_color) = data.accent_color {
            self.accent_color = Some(accent_color);
        }
        if let Some(public_flags) = data.public_flags {
            self.public_flags = Some(public_flags);
        }
        if let Some(bot) = data.bot {
            self.bot = bot;
        }
        if let Some(system) = data.system {
            self.system = system;
        }
        if let Some(status) = &data.status {
            self.status = Some(status.clone());
        }
    }

    /// Get the full tag: username#discriminator
    pub fn tag(&self) -> Option<String> {
        match (&self.username, &self.discriminator) {
            (Some(name), Some(disc)) => Some(format!("{name}#{disc}")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data_requires_identity() {
        let data = UserData {
            username: Some("nomad".to_string()),
            ..UserData::default()
        };
        assert!(matches!(
            User::from_data(&data),
            Err(DomainError::MissingIdentity)
        ));
    }

    #[test]
    fn test_partial_apply_preserves_existing_fields() {
        let base = UserData {
            id: Some(Snowflake::new(1)),
            username: Some("nomad".to_string()),
            discriminator: Some("0001".to_string()),
            ..UserData::default()
        };
        let mut user = User::from_data(&base).unwrap();

        let patch = UserData {
            id: Some(Snowflake::new(1)),
            status: Some("idle".to_string()),
            ..UserData::default()
        };
        user.apply(&patch);

        assert_eq!(user.username.as_deref(), Some("nomad"));
        assert_eq!(user.status.as_deref(), Some("idle"));
        assert_eq!(user.tag().as_deref(), Some("nomad#0001"));
    }

    #[test]
    fn test_user_id_alias() {
        let data: UserData =
            serde_json::from_str(r#"{"user_id": "42", "status": "online"}"#).unwrap();
        assert_eq!(data.identity(), Some(Snowflake::new(42)));
    }
}
