//! Test fixtures
//!
//! JSON builders for bootstrap payloads and a compressing counterpart of the
//! gateway's continuous zlib stream.

use flate2::{Compress, Compression, FlushCompress};
use serde_json::{json, Value};

use concord_gateway::{ReadyPayload, ReadySupplementalPayload, SYNC_FLUSH_SUFFIX};

/// Build a primary bootstrap payload with two guilds, one shared user, and
/// one relationship of each kind
#[must_use]
pub fn ready_two_guilds() -> ReadyPayload {
    parse_ready(&json!({
        "v": 9,
        "session_id": "session-abc",
        "resume_gateway_url": "wss://resume.concord.test",
        "user": {"id": "1", "username": "self"},
        "guilds": [
            {"id": "10", "name": "First"},
            {"id": "20", "name": "Second"}
        ],
        "private_channels": [
            {"id": "30", "type": 1, "recipients": [{"id": "100", "username": "ada"}]}
        ],
        "users": [
            {"id": "100", "username": "ada"}
        ],
        "relationships": [
            {"id": "100", "type": 1},
            {"id": "300", "type": 2}
        ]
    }))
}

/// Build the matching supplemental payload: index 0 gets one member, index 1
/// gets two
#[must_use]
pub fn supplemental_two_guilds() -> ReadySupplementalPayload {
    parse_supplemental(&json!({
        "guilds": [
            {"id": "10", "member_count": 1},
            {"id": "20", "member_count": 2}
        ],
        "merged_members": [
            [{"user_id": "100", "nick": "m1"}],
            [{"user_id": "200", "nick": "m2"}, {"user_id": "300", "nick": "m3"}]
        ],
        "merged_presences": {
            "guilds": [
                [{"user_id": "100", "status": "online"}]
            ],
            "friends": [
                {"user_id": "100", "status": "online"}
            ]
        }
    }))
}

/// Parse a ready payload from JSON
#[must_use]
pub fn parse_ready(value: &Value) -> ReadyPayload {
    serde_json::from_value(value.clone()).expect("valid ready fixture")
}

/// Parse a supplemental payload from JSON
#[must_use]
pub fn parse_supplemental(value: &Value) -> ReadySupplementalPayload {
    serde_json::from_value(value.clone()).expect("valid supplemental fixture")
}

/// Server side of the continuous compressed stream
///
/// Each document becomes one sync-flushed segment of a single shared zlib
/// stream, exactly as the gateway emits them.
pub struct StreamCompressor {
    context: Compress,
}

impl StreamCompressor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: Compress::new(Compression::default(), true),
        }
    }

    /// Compress one document into a suffix-terminated segment
    pub fn segment(&mut self, document: &[u8]) -> Vec<u8> {
        let mut output = Vec::with_capacity(document.len() + 1024);
        self.context
            .compress_vec(document, &mut output, FlushCompress::Sync)
            .expect("compression cannot fail in fixtures");
        assert!(output.ends_with(&SYNC_FLUSH_SUFFIX));
        output
    }
}

impl Default for StreamCompressor {
    fn default() -> Self {
        Self::new()
    }
}
