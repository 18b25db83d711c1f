//! Session lifecycle
//!
//! Connection state machine, member range requests, live cache maintenance,
//! and the orchestrator that owns the socket and drives the read loop.

mod cache_events;
mod gateway_session;
mod members;
mod state;

pub use gateway_session::GatewaySession;
pub use members::{member_ranges, MAX_RANGES_PER_REQUEST, MAX_RANGE_SPAN};
pub use state::{SessionState, SessionStatus, StateError};
