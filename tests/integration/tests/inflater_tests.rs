//! Streaming decompression integration tests
//!
//! Verifies the boundary-driven reassembly property: however the compressed
//! bytes are sliced into frames, the document sequence only depends on where
//! the sync-flush markers sit.
//!
//! Run with: cargo test -p integration-tests --test inflater_tests

use concord_gateway::{GatewayFrame, InflateError, StreamInflater};
use integration_tests::StreamCompressor;

const DOCUMENTS: [&[u8]; 3] = [
    br#"{"op":10,"d":{"heartbeat_interval":41250}}"#,
    br#"{"op":0,"s":1,"t":"READY","d":{"session_id":"abc"}}"#,
    br#"{"op":11,"d":null}"#,
];

/// Compress the fixture documents as one continuous stream
fn compressed_segments() -> Vec<Vec<u8>> {
    let mut compressor = StreamCompressor::new();
    DOCUMENTS
        .iter()
        .map(|document| compressor.segment(document))
        .collect()
}

/// Feed `bytes` split into `chunk` sized frames, collecting all documents
fn feed_chunked(inflater: &mut StreamInflater, bytes: &[u8], chunk: usize) -> Vec<Vec<u8>> {
    let mut documents = Vec::new();
    for frame in bytes.chunks(chunk) {
        documents.extend(inflater.feed(frame).expect("stream is well-formed"));
    }
    documents
}

#[test]
fn test_reassembly_is_boundary_driven_not_frame_driven() {
    let segments = compressed_segments();
    let stream: Vec<u8> = segments.concat();

    // Reference: one frame per segment
    let mut reference = StreamInflater::new();
    let mut expected = Vec::new();
    for segment in &segments {
        expected.extend(reference.feed(segment).unwrap());
    }
    assert_eq!(expected.len(), DOCUMENTS.len());

    // The same bytes as one block, and split at 1, 3, 7, 11 byte frames
    for chunk in [stream.len(), 1, 3, 7, 11] {
        let mut inflater = StreamInflater::new();
        let documents = feed_chunked(&mut inflater, &stream, chunk);
        assert_eq!(documents, expected, "chunk size {chunk}");
        assert_eq!(inflater.buffered_len(), 0);
    }
}

#[test]
fn test_documents_decode_into_frames() {
    let segments = compressed_segments();
    let mut inflater = StreamInflater::new();

    let mut frames = Vec::new();
    for segment in &segments {
        for document in inflater.feed(segment).unwrap() {
            frames.push(GatewayFrame::from_slice(&document).unwrap());
        }
    }

    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].op, 10);
    assert_eq!(frames[1].s, Some(1));
    assert_eq!(frames[1].event_name(), Some("READY"));
    assert_eq!(frames[2].op, 11);
}

#[test]
fn test_mid_stream_corruption_is_fatal() {
    let mut compressor = StreamCompressor::new();
    let good = compressor.segment(DOCUMENTS[0]);

    let mut inflater = StreamInflater::new();
    inflater.feed(&good).unwrap();

    // The stream is byte-aligned after a sync flush, so the next segment
    // opens a new block; 0xFF sets the reserved block type, which no
    // decoder accepts.
    let mut corrupt = compressor.segment(DOCUMENTS[1]);
    corrupt[0] = 0xFF;

    assert!(matches!(
        inflater.feed(&corrupt),
        Err(InflateError::StreamCorrupt(_))
    ));
}

#[test]
fn test_reset_yields_a_usable_fresh_context() {
    // After a corrupt stream the whole connection restarts; the replacement
    // context must decode a brand new stream from its beginning.
    let mut inflater = StreamInflater::new();
    let mut garbage = vec![0x01, 0x02, 0x03];
    garbage.extend_from_slice(&concord_gateway::SYNC_FLUSH_SUFFIX);
    assert!(matches!(
        inflater.feed(&garbage),
        Err(InflateError::StreamCorrupt(_))
    ));

    inflater.reset();
    let mut compressor = StreamCompressor::new();
    let segment = compressor.segment(DOCUMENTS[0]);
    let documents = inflater.feed(&segment).unwrap();
    assert_eq!(documents, vec![DOCUMENTS[0].to_vec()]);
}
