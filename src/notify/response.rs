//! One-shot reply delivery over the response characteristic.
//!
//! A reply is serialized to JSON, split by [`chunks`] into pieces no larger
//! than the negotiated notification size, and closed with a terminator
//! chunk. Replies are written one at a time: a second reply waits until the
//! first has been fully written, so the client never sees interleaved
//! chunks.

use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use serde::Serialize;

use super::Subscription;
use crate::codec::JsonCodec;
use crate::error::{DeliveryError, Result};
use crate::protocol::chunks;

/// Characteristic name used in logs and errors.
pub const RESPONSE_CHANNEL: &str = "response";

/// Writer for complete, terminated replies.
#[derive(Debug)]
pub struct ResponseChannel {
    subscription: Subscription,
    /// Held for the duration of one reply.
    write_lock: Mutex<()>,
}

impl ResponseChannel {
    /// Create a response channel with no subscriber.
    pub fn new() -> Self {
        Self {
            subscription: Subscription::new(RESPONSE_CHANNEL),
            write_lock: Mutex::new(()),
        }
    }

    /// The subscription slot the radio drives.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Serialize `value` and write it as one terminated, chunked reply.
    ///
    /// Returns the number of notifications written, terminator included.
    ///
    /// # Errors
    ///
    /// [`DeliveryError::NotSubscribed`] when nobody is subscribed; nothing is
    /// written in that case. [`DeliveryError::Interrupted`] when the
    /// subscription changes part way through.
    pub fn deliver<T: Serialize + ?Sized>(&self, value: &T) -> Result<usize> {
        let data = JsonCodec::encode(value)?;
        self.deliver_bytes(Bytes::from(data))
    }

    /// Write already-encoded bytes as one terminated, chunked reply.
    pub fn deliver_bytes(&self, data: Bytes) -> Result<usize> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let active = match self.subscription.active() {
            Some(active) => active,
            None => {
                tracing::error!(
                    "Unable to write response object, device did not subscribe to the response channel"
                );
                return Err(DeliveryError::NotSubscribed {
                    channel: RESPONSE_CHANNEL,
                }
                .into());
            }
        };

        let parts = chunks(data, active.max_chunk_size);
        let total = parts.count_total();
        tracing::debug!(
            total,
            chunk_size = active.max_chunk_size,
            "Writing response in chunks"
        );

        for (sent, chunk) in parts.enumerate() {
            if !self.subscription.is_current(active.generation) {
                tracing::warn!(sent, total, "Response subscription changed mid-reply");
                return Err(DeliveryError::Interrupted {
                    channel: RESPONSE_CHANNEL,
                    sent,
                    total,
                }
                .into());
            }
            tracing::trace!(chunk = sent + 1, len = chunk.len(), "Sending response chunk");
            active
                .sink
                .notify(chunk)
                .map_err(|e| e.on_channel(RESPONSE_CHANNEL))?;
        }

        Ok(total)
    }
}

impl Default for ResponseChannel {
    fn default() -> Self {
        Self::new()
    }
}
