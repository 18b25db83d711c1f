//! Gateway wire protocol
//!
//! Opcode table, the `{op, d, s, t}` frame envelope, and the payload
//! structures for client-sent frames.

mod frame;
mod opcodes;
mod payloads;

pub use frame::GatewayFrame;
pub use opcodes::OpCode;
pub use payloads::{
    ChannelRangesPayload, ClientProperties, ClientState, HelloData, IdentifyPayload,
    MemberRangesPayload, PresencePayload, ResumePayload,
};
