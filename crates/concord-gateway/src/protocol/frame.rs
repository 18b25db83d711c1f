//! Gateway frame envelope
//!
//! Every message on the socket is a `{op, d, s, t}` document. The raw `op`
//! integer is kept as received so frames with opcodes this client does not
//! know still decode; the session decides what to do with them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ChannelRangesPayload, IdentifyPayload, MemberRangesPayload, OpCode, PresencePayload,
    ResumePayload,
};

/// Gateway frame envelope
///
/// Invariant: `s` is monotonically non-decreasing across frames that carry it
/// and must be retained for resume (tracked by `SessionState`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayFrame {
    /// Operation code, kept raw for forward compatibility
    pub op: u8,

    /// Event data payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,

    /// Sequence number (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event name (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayFrame {
    /// The typed opcode, if this client recognizes it
    #[must_use]
    pub fn opcode(&self) -> Option<OpCode> {
        OpCode::from_u8(self.op)
    }

    /// Create a frame carrying an arbitrary payload
    #[must_use]
    pub fn new(op: OpCode, d: Value) -> Self {
        Self {
            op: op.as_u8(),
            d: Some(d),
            s: None,
            t: None,
        }
    }

    // === Client frames ===

    /// Create a Heartbeat frame (op=1) carrying the last known sequence
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self {
            op: OpCode::Heartbeat.as_u8(),
            d: Some(last_sequence.map_or(Value::Null, |s| Value::Number(s.into()))),
            s: None,
            t: None,
        }
    }

    /// Create an Identify frame (op=2)
    #[must_use]
    pub fn identify(payload: &IdentifyPayload) -> Self {
        Self::new(
            OpCode::Identify,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Create a Resume frame (op=6)
    #[must_use]
    pub fn resume(payload: &ResumePayload) -> Self {
        Self::new(
            OpCode::Resume,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Create a Presence Update frame (op=3)
    #[must_use]
    pub fn presence_update(payload: &PresencePayload) -> Self {
        Self::new(
            OpCode::PresenceUpdate,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Create a member range request frame (op=8, legacy deployments)
    #[must_use]
    pub fn request_members(payload: &MemberRangesPayload) -> Self {
        Self::new(
            OpCode::RequestMembers,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Create a channel member range request frame (op=14)
    #[must_use]
    pub fn request_channel_members(payload: &ChannelRangesPayload) -> Self {
        Self::new(
            OpCode::GuildSubscriptions,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    // === Utilities ===

    /// The dispatch event name, if this is a dispatch frame
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        self.t.as_deref()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON text
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Deserialize from raw JSON bytes (inflater output)
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl std::fmt::Display for GatewayFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self
            .opcode()
            .map_or("Unknown", OpCode::name);
        if let Some(t) = &self.t {
            write!(f, "GatewayFrame(op={} {name}, t={t}", self.op)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayFrame(op={} {name})", self.op)
        }
    }
}
