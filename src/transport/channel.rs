//! Write channels and their acknowledgments.

use std::fmt;

/// Inbound write channel a frame was carried on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Fire-and-forget commands; only a write acknowledgment comes back.
    Command,
    /// Requests; exactly one reply is written to the response channel.
    Request,
}

impl Channel {
    /// Lowercase channel name, used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Command => "command",
            Channel::Request => "request",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a write request, as reported to the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// Write accepted (ATT success).
    Success,
    /// Write rejected (ATT "unlikely error").
    UnlikelyError,
}

impl Ack {
    /// ATT result code for this acknowledgment.
    pub fn code(&self) -> u8 {
        match self {
            Ack::Success => 0x00,
            Ack::UnlikelyError => 0x0E,
        }
    }

    /// True for [`Ack::Success`].
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Ack::Success)
    }
}
