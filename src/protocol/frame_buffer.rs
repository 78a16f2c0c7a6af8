//! Frame buffer for accumulating partial writes.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management. A BLE write
//! carries at most one MTU worth of bytes, so a single frame usually arrives
//! over several writes. The buffer keeps everything after the last
//! terminator and hands out frames only once they are complete.
//!
//! # Example
//!
//! ```
//! use botwire::protocol::FrameBuffer;
//!
//! let mut buffer = FrameBuffer::new();
//!
//! assert!(buffer.push(br#"{"name":"#).is_empty());
//! let frames = buffer.push(b"\"wave\"}\0");
//!
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].payload(), br#"{"name":"wave"}"#);
//! ```

use bytes::BytesMut;

use super::{Frame, TERMINATOR};

/// Default initial capacity, a few negotiated MTUs worth of bytes.
const DEFAULT_CAPACITY: usize = 1024;

/// Buffer for accumulating incoming bytes and extracting complete frames.
///
/// One buffer belongs to exactly one write channel. It only ever holds bytes
/// that do not yet belong to a completed frame.
#[derive(Debug)]
pub struct FrameBuffer {
    /// Bytes received since the last terminator.
    buffer: BytesMut,
    /// Prefix of `buffer` already known to contain no terminator.
    scanned: usize,
}

impl FrameBuffer {
    /// Create a new, empty frame buffer.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new frame buffer with a custom initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            scanned: 0,
        }
    }

    /// Push a fragment into the buffer and extract all complete frames.
    ///
    /// Returns the frames in arrival order. An empty result means the
    /// fragment was buffered and the client should be asked for more.
    pub fn push(&mut self, fragment: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(fragment);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one() {
            frames.push(frame);
        }
        frames
    }

    /// Try to extract a single frame from the buffer.
    fn try_extract_one(&mut self) -> Option<Frame> {
        let offset = self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == TERMINATOR);

        match offset {
            Some(offset) => {
                let end = self.scanned + offset;
                let payload = self.buffer.split_to(end).freeze();
                // Drop the terminator itself.
                let _ = self.buffer.split_to(1);
                self.scanned = 0;
                Some(Frame::new(payload))
            }
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discard any partial frame.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
