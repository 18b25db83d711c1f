//! # concord-gateway
//!
//! Gateway session engine: connection lifecycle, streaming decompression,
//! heartbeat/liveness protocol, inbound frame dispatch, and the two-phase
//! bootstrap reconciliation that merges the initial snapshot into the shared
//! entity cache.

pub mod bootstrap;
pub mod compression;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod heartbeat;
pub mod protocol;
pub mod session;

pub use bootstrap::{BootstrapReconciler, ReconciliationGap, ReconciliationReport};
pub use compression::{InflateError, StreamInflater, SYNC_FLUSH_SUFFIX};
pub use dispatch::Dispatcher;
pub use error::GatewayError;
pub use events::{
    lifecycle, GatewayEventType, MergedPresences, ReadyPayload, ReadySupplementalPayload,
};
pub use heartbeat::HeartbeatScheduler;
pub use protocol::{GatewayFrame, OpCode};
pub use session::{GatewaySession, SessionState, SessionStatus};
