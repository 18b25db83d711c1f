//! Continuous zlib-stream inflater
//!
//! One decompression context lives for the whole physical connection; every
//! frame continues the same logical stream, so the context must never be
//! recreated per message. Frames are buffered until the 4-byte sync-flush
//! marker arrives; only then is the buffered segment inflated into a complete
//! JSON document.
//!
//! A decode failure after a complete-looking buffer means the shared context
//! is desynchronized. That is unrecoverable locally: the caller must close
//! the connection and reconnect with a fresh `StreamInflater`.

use flate2::{Decompress, FlushDecompress, Status};
use thiserror::Error;

/// Marker terminating every complete compressed document (zlib SYNC_FLUSH)
pub const SYNC_FLUSH_SUFFIX: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];

/// Output is grown in steps of this size while a segment inflates
const OUTPUT_CHUNK: usize = 16 * 1024;

/// Streaming inflater errors
#[derive(Debug, Error)]
pub enum InflateError {
    /// The shared decompression context is desynchronized; fatal to the
    /// connection
    #[error("compressed stream corrupted: {0}")]
    StreamCorrupt(String),
}

/// Continuous inflater for one physical connection
pub struct StreamInflater {
    context: Decompress,
    buffer: Vec<u8>,
}

impl StreamInflater {
    /// Create a fresh inflater with a new decompression context
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: Decompress::new(true),
            buffer: Vec::new(),
        }
    }

    /// Feed raw frame bytes, returning every complete JSON document
    ///
    /// Frames lacking the sync-flush suffix are buffered and concatenated
    /// with subsequent frames (an empty result, not an error). A single call
    /// may return several documents when the input spans multiple suffix
    /// boundaries: reassembly is boundary-driven, not frame-count-driven.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Vec<u8>>, InflateError> {
        self.buffer.extend_from_slice(bytes);

        let mut documents = Vec::new();
        while let Some(end) = find_boundary(&self.buffer) {
            let segment: Vec<u8> = self.buffer.drain(..end).collect();
            documents.push(self.inflate_segment(&segment)?);
        }
        Ok(documents)
    }

    /// Discard the context and all buffered bytes
    ///
    /// Required on every reconnect; a stream from a previous connection is
    /// invalid and must never be reused.
    pub fn reset(&mut self) {
        self.context = Decompress::new(true);
        self.buffer.clear();
    }

    /// Bytes currently buffered awaiting a suffix marker
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Inflate one suffix-terminated segment through the shared context
    fn inflate_segment(&mut self, segment: &[u8]) -> Result<Vec<u8>, InflateError> {
        let mut output = Vec::with_capacity(OUTPUT_CHUNK);
        let mut consumed = 0usize;

        loop {
            if output.len() == output.capacity() {
                output.reserve(OUTPUT_CHUNK);
            }

            let before_in = self.context.total_in();
            let before_out = self.context.total_out();
            let status = self
                .context
                .decompress_vec(&segment[consumed..], &mut output, FlushDecompress::Sync)
                .map_err(|e| InflateError::StreamCorrupt(e.to_string()))?;
            consumed += (self.context.total_in() - before_in) as usize;

            match status {
                // The gateway never terminates the logical stream mid-connection
                Status::StreamEnd => {
                    return Err(InflateError::StreamCorrupt(
                        "unexpected end of compressed stream".to_string(),
                    ));
                }
                Status::Ok | Status::BufError => {
                    // Input exhausted and output not clipped by capacity:
                    // the segment is fully flushed
                    if consumed >= segment.len() && output.len() < output.capacity() {
                        return Ok(output);
                    }
                    // No forward progress with input remaining means the
                    // context cannot make sense of these bytes
                    let stalled = self.context.total_in() == before_in
                        && self.context.total_out() == before_out
                        && output.len() < output.capacity();
                    if stalled {
                        return Err(InflateError::StreamCorrupt(
                            "decompressor stalled on buffered segment".to_string(),
                        ));
                    }
                }
            }
        }
    }
}

impl Default for StreamInflater {
    fn default() -> Self {
        Self::new()
    }
}

/// Position one past the first sync-flush suffix, if the buffer contains one
fn find_boundary(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(SYNC_FLUSH_SUFFIX.len())
        .position(|window| window == SYNC_FLUSH_SUFFIX)
        .map(|index| index + SYNC_FLUSH_SUFFIX.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compress, Compression, FlushCompress};

    /// Compress one document as a sync-flushed segment of a shared stream
    fn compress_segment(context: &mut Compress, document: &[u8]) -> Vec<u8> {
        let mut output = Vec::with_capacity(document.len() + 1024);
        context
            .compress_vec(document, &mut output, FlushCompress::Sync)
            .unwrap();
        assert!(output.ends_with(&SYNC_FLUSH_SUFFIX));
        output
    }

    #[test]
    fn test_single_document() {
        let mut compressor = Compress::new(Compression::default(), true);
        let segment = compress_segment(&mut compressor, br#"{"op":10}"#);

        let mut inflater = StreamInflater::new();
        let documents = inflater.feed(&segment).unwrap();
        assert_eq!(documents, vec![br#"{"op":10}"#.to_vec()]);
        assert_eq!(inflater.buffered_len(), 0);
    }

    #[test]
    fn test_partial_frames_buffer_until_suffix() {
        let mut compressor = Compress::new(Compression::default(), true);
        let segment = compress_segment(&mut compressor, br#"{"op":11,"d":null}"#);
        let (head, tail) = segment.split_at(segment.len() / 2);

        let mut inflater = StreamInflater::new();
        assert!(inflater.feed(head).unwrap().is_empty());
        assert!(inflater.buffered_len() > 0);

        let documents = inflater.feed(tail).unwrap();
        assert_eq!(documents, vec![br#"{"op":11,"d":null}"#.to_vec()]);
    }

    #[test]
    fn test_boundary_driven_reassembly() {
        // Two documents on one shared stream, delivered as one block: the
        // output must match feeding them frame by frame.
        let mut compressor = Compress::new(Compression::default(), true);
        let first = compress_segment(&mut compressor, br#"{"op":10}"#);
        let second = compress_segment(&mut compressor, br#"{"op":0,"s":1,"t":"READY"}"#);

        let mut block = first.clone();
        block.extend_from_slice(&second);

        let mut inflater = StreamInflater::new();
        let documents = inflater.feed(&block).unwrap();
        assert_eq!(
            documents,
            vec![
                br#"{"op":10}"#.to_vec(),
                br#"{"op":0,"s":1,"t":"READY"}"#.to_vec(),
            ]
        );

        let mut frame_by_frame = StreamInflater::new();
        let mut collected = Vec::new();
        collected.extend(frame_by_frame.feed(&first).unwrap());
        collected.extend(frame_by_frame.feed(&second).unwrap());
        assert_eq!(documents, collected);
    }

    #[test]
    fn test_context_persists_across_documents() {
        // The second segment back-references the first through the shared
        // dictionary; a per-message context would fail to decode it.
        let mut compressor = Compress::new(Compression::default(), true);
        let repeated = br#"{"op":0,"t":"MESSAGE_CREATE","d":{"content":"repeated content"}}"#;
        let first = compress_segment(&mut compressor, repeated);
        let second = compress_segment(&mut compressor, repeated);

        let mut inflater = StreamInflater::new();
        assert_eq!(inflater.feed(&first).unwrap(), vec![repeated.to_vec()]);
        assert_eq!(inflater.feed(&second).unwrap(), vec![repeated.to_vec()]);
    }

    #[test]
    fn test_corrupt_segment_is_fatal() {
        let mut inflater = StreamInflater::new();
        let mut garbage = vec![0x01, 0x02, 0x03, 0x04, 0x05];
        garbage.extend_from_slice(&SYNC_FLUSH_SUFFIX);

        assert!(matches!(
            inflater.feed(&garbage),
            Err(InflateError::StreamCorrupt(_))
        ));
    }

    #[test]
    fn test_reset_discards_buffered_bytes() {
        let mut compressor = Compress::new(Compression::default(), true);
        let segment = compress_segment(&mut compressor, br#"{"op":10}"#);

        let mut inflater = StreamInflater::new();
        inflater.feed(&segment[..3]).unwrap();
        assert!(inflater.buffered_len() > 0);

        inflater.reset();
        assert_eq!(inflater.buffered_len(), 0);
    }
}
