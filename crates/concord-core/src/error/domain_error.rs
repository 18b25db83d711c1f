//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// A wire payload carried no usable identity field
    #[error("payload carries no identity field")]
    MissingIdentity,

    #[error("user not found: {0}")]
    UserNotFound(Snowflake),

    #[error("guild not found: {0}")]
    GuildNotFound(Snowflake),

    #[error("channel not found: {0}")]
    ChannelNotFound(Snowflake),

    #[error("validation error: {0}")]
    ValidationError(String),
}
