//! Member entity - a user's membership in one guild

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::user::UserData;
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Guild member entity (junction between User and Guild)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildMember {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub nickname: Option<String>,
    pub role_ids: Vec<Snowflake>,
    pub joined_at: Option<DateTime<Utc>>,
}

/// Partial member payload
///
/// Bootstrap member batches carry a flat `user_id`; live member events nest a
/// full user object instead. `identity()` resolves either spelling.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberData {
    pub user_id: Option<Snowflake>,
    pub user: Option<UserData>,
    #[serde(alias = "nickname")]
    pub nick: Option<String>,
    pub roles: Option<Vec<Snowflake>>,
    pub joined_at: Option<DateTime<Utc>>,
}

impl MemberData {
    /// The user identity this member fragment refers to
    pub fn identity(&self) -> Option<Snowflake> {
        self.user_id
            .or_else(|| self.user.as_ref().and_then(UserData::identity))
    }

    /// View of this member as a user patch for the shared user cache
    pub fn as_user_data(&self) -> UserData {
        let mut data = self.user.clone().unwrap_or_default();
        if data.id.is_none() {
            data.id = self.user_id;
        }
        data
    }
}

impl GuildMember {
    /// Construct a member from a fragment, attached to a guild
    pub fn from_data(guild_id: Snowflake, data: &MemberData) -> Result<Self, DomainError> {
        let user_id = data.identity().ok_or(DomainError::MissingIdentity)?;
        let mut member = Self {
            guild_id,
            user_id,
            nickname: None,
            role_ids: Vec::new(),
            joined_at: None,
        };
        member.apply(data);
        Ok(member)
    }

    /// Merge a later fragment; only present fields overwrite
    pub fn apply(&mut self, data: &MemberData) {
        if let Some(nick) = &data.nick {
            self.nickname = Some(nick.clone());
        }
        if let Some(roles) = &data.roles {
            self.role_ids = roles.clone();
        }
        if let Some(joined_at) = data.joined_at {
            self.joined_at = Some(joined_at);
        }
    }

    /// Display name (nickname if set, otherwise fallback)
    pub fn display_name<'a>(&'a self, username: &'a str) -> &'a str {
        self.nickname.as_deref().unwrap_or(username)
    }

    /// Check if member has a specific role
    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.role_ids.contains(&role_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_flat_and_nested() {
        let flat: MemberData = serde_json::from_str(r#"{"user_id": "9"}"#).unwrap();
        assert_eq!(flat.identity(), Some(Snowflake::new(9)));

        let nested: MemberData = serde_json::from_str(r#"{"user": {"id": "9"}}"#).unwrap();
        assert_eq!(nested.identity(), Some(Snowflake::new(9)));
    }

    #[test]
    fn test_member_merge() {
        let guild = Snowflake::new(1);
        let data = MemberData {
            user_id: Some(Snowflake::new(9)),
            nick: Some("wren".to_string()),
            roles: Some(vec![Snowflake::new(5)]),
            ..MemberData::default()
        };
        let mut member = GuildMember::from_data(guild, &data).unwrap();
        assert!(member.has_role(Snowflake::new(5)));
        assert_eq!(member.display_name("fallback"), "wren");

        member.apply(&MemberData {
            roles: Some(vec![]),
            ..MemberData::default()
        });
        assert!(!member.has_role(Snowflake::new(5)));
        // nickname untouched by a patch without one
        assert_eq!(member.nickname.as_deref(), Some("wren"));
    }
}
