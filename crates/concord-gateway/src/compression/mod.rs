//! Streaming decompression
//!
//! The gateway multiplexes the whole connection's JSON traffic as one logical
//! DEFLATE stream split across WebSocket frames.

mod inflater;

pub use inflater::{InflateError, StreamInflater, SYNC_FLUSH_SUFFIX};
