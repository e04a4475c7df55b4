//! Response buffer for accumulating partial reads.
//!
//! Inbound data arrives in chunks that need not line up with responses: one
//! response may be split over several chunks, and one chunk may carry the
//! tail of a response plus the start of the next. `ResponseBuffer` keeps the
//! bytes in a single `BytesMut` and hands out one complete response at a
//! time, using the declared lengths of the response grammar to find its end.
//! A `FrameScanner` remembers how far the current response has been checked,
//! so pushing a large response in many chunks stays linear.

use bytes::{Bytes, BytesMut};

use crate::error::Result;
use super::codec::FrameScanner;

/// Accumulates inbound chunks and splits off complete responses
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    buffer: BytesMut,

    /// Progress through the response at the front of `buffer`
    scanner: FrameScanner,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            scanner: FrameScanner::new(),
        }
    }

    /// Append a chunk as received from the transport
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Split off the next complete response, if one is buffered
    ///
    /// Surplus bytes stay buffered as the start of the following response.
    /// On `ProtocolCorruption` the buffer is left untouched; the caller
    /// decides whether to `clear` it.
    pub fn next_response(&mut self) -> Result<Option<Bytes>> {
        match self.scanner.scan(&self.buffer)? {
            Some(len) => Ok(Some(self.buffer.split_to(len).freeze())),
            None => Ok(None),
        }
    }

    /// Number of buffered bytes not yet returned
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Buffered bytes already known to belong to the pending response
    pub fn scanned(&self) -> usize {
        self.scanner.scanned()
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanner.reset();
    }
}
