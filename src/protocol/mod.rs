//! Protocol module - framing and chunking.
//!
//! Messages in both directions are JSON text terminated by a single NUL byte,
//! with no length prefix:
//! - [`FrameBuffer`] reassembles inbound write fragments into frames
//! - [`chunks`] splits an outbound message into notification-sized pieces
//!   followed by a lone terminator chunk

mod chunker;
mod frame;
mod frame_buffer;

pub use chunker::{chunks, Chunks};
pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;

/// End-of-message marker for both inbound frames and outbound replies.
pub const TERMINATOR: u8 = 0x00;
