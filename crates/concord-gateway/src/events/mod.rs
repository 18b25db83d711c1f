//! Gateway events
//!
//! Dispatch event names, bootstrap payload structures, and the synthetic
//! lifecycle events this core emits to the rest of the system.

mod event_types;
mod payloads;

pub use event_types::GatewayEventType;
pub use payloads::{MergedPresences, ReadyPayload, ReadySupplementalPayload};

/// Synthetic lifecycle events emitted by the session itself
pub mod lifecycle {
    /// Primary bootstrap payload fully reconciled
    pub const SESSION_READY: &str = "session_ready";
    /// Supplemental bootstrap payload fully reconciled; startup consumers may run
    pub const SESSION_READY_SUPPLEMENTAL: &str = "session_ready_supplemental";
    /// Transport dropped; a reconnect (resume when possible) is underway
    pub const SESSION_RECONNECTING: &str = "session_reconnecting";
    /// Server invalidated the session; the client will re-identify
    pub const SESSION_INVALIDATED: &str = "session_invalidated";
}
