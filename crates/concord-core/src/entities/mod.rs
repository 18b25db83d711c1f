//! Domain entities and their wire patch types
//!
//! Every entity has a companion `*Data` struct: the all-optional shape the
//! gateway actually sends. Entities are constructed from a patch and merged
//! with later patches; only fields present in a patch overwrite.

mod channel;
mod guild;
mod member;
mod message;
mod presence;
mod relationship;
mod user;

pub use channel::{Channel, ChannelData, ChannelType};
pub use guild::{Guild, GuildData};
pub use member::{GuildMember, MemberData};
pub use message::{Message, MessageData};
pub use presence::PresenceData;
pub use relationship::{Relationship, RelationshipData, RelationshipType};
pub use user::{User, UserData};
