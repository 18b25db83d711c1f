//! Gateway error taxonomy
//!
//! Transport and stream errors are handled locally by the session's reconnect
//! state machine; protocol violations are logged and swallowed; nothing here
//! escapes to the wider application unhandled.

use thiserror::Error;

use crate::compression::InflateError;
use crate::session::StateError;

/// Gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Socket-level failure; always triggers the reconnect path, preserving
    /// session identity for resume when available
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// Decompression desync; fatal to the connection, forces a full
    /// reconnect with a fresh IDENTIFY
    #[error("compressed stream corrupted: {0}")]
    StreamCorrupt(String),

    /// Well-formed JSON the client cannot interpret; logged and ignored
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Envelope (de)serialization failure
    #[error("frame codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Missed heartbeat acknowledgement; treated like a transport error
    #[error("liveness timeout: heartbeat acknowledgement missed")]
    LivenessTimeout,

    /// Send attempted while no connection is up
    #[error("not connected to the gateway")]
    NotConnected,

    /// Illegal session state transition
    #[error(transparent)]
    State(#[from] StateError),

    /// Entity cache rejected a merge operation
    #[error(transparent)]
    Domain(#[from] concord_core::DomainError),
}

impl From<InflateError> for GatewayError {
    fn from(err: InflateError) -> Self {
        match err {
            InflateError::StreamCorrupt(reason) => Self::StreamCorrupt(reason),
        }
    }
}
