//! Frame struct with typed accessors.
//!
//! A frame is everything a client wrote before a terminator byte. The
//! terminator itself is never part of the payload.
//!
//! # Example
//!
//! ```
//! use botwire::protocol::{build_frame, Frame, TERMINATOR};
//! use bytes::Bytes;
//!
//! let wire = build_frame(br#"{"name":"wave"}"#);
//! assert_eq!(wire.last(), Some(&TERMINATOR));
//!
//! let frame = Frame::new(Bytes::from_static(br#"{"name":"wave"}"#));
//! assert_eq!(frame.len(), 15);
//! ```

use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::TERMINATOR;
use crate::codec::JsonCodec;
use crate::error::Result;

/// A complete inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Payload bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from its payload.
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    /// Create a frame from raw bytes (copies data).
    pub fn from_slice(payload: &[u8]) -> Self {
        Self {
            payload: Bytes::copy_from_slice(payload),
        }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True if the terminator arrived with nothing before it.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Decode the payload as JSON text.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        JsonCodec::decode(&self.payload)
    }
}

/// Build the wire form of a frame: payload followed by the terminator.
pub fn build_frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 1);
    out.extend_from_slice(payload);
    out.push(TERMINATOR);
    out
}
