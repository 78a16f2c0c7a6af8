//! Live transcript delivery over the listen characteristic.
//!
//! Unlike replies, transcript items are neither chunked nor terminated: each
//! utterance is one notification, cut to the negotiated size if it is too
//! long. The next utterance follows anyway.
//!
//! Nobody listening means the microphone is working for nothing, so a
//! delivery attempt without a subscriber also stops the actuator's stream.

use std::sync::Arc;

use bytes::Bytes;

use super::Subscription;
use crate::actuator::Actuator;
use crate::error::{DeliveryError, Result};

/// Characteristic name used in logs and errors.
pub const LISTEN_CHANNEL: &str = "listen";

/// Writer for the speech-to-text stream.
pub struct ListenChannel {
    subscription: Subscription,
    actuator: Arc<dyn Actuator>,
}

impl ListenChannel {
    /// Create a listen channel with no subscriber.
    pub fn new(actuator: Arc<dyn Actuator>) -> Self {
        Self {
            subscription: Subscription::new(LISTEN_CHANNEL),
            actuator,
        }
    }

    /// The subscription slot the radio drives.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Send one transcript item as a single notification.
    ///
    /// # Errors
    ///
    /// [`DeliveryError::NotSubscribed`] when nobody is subscribed, after
    /// asking the actuator to stop listening.
    pub fn deliver_text(&self, text: &str) -> Result<()> {
        let active = match self.subscription.active() {
            Some(active) => active,
            None => {
                tracing::error!(
                    "Received transcript but device is not subscribed to the listen channel, stopping listen"
                );
                if let Err(e) = self.actuator.stop_listening() {
                    tracing::error!(error = %e, "Failed to stop listening");
                }
                return Err(DeliveryError::NotSubscribed {
                    channel: LISTEN_CHANNEL,
                }
                .into());
            }
        };

        let msg = truncate_utf8(text, active.max_chunk_size);
        tracing::trace!(text = msg, "Updating listen value");
        active
            .sink
            .notify(Bytes::copy_from_slice(msg.as_bytes()))
            .map_err(|e| e.on_channel(LISTEN_CHANNEL).into())
    }
}

impl std::fmt::Debug for ListenChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenChannel")
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

/// Longest prefix of `text` that fits in `max` bytes without splitting a
/// character. Zero means unlimited.
fn truncate_utf8(text: &str, max: usize) -> &str {
    if max == 0 || text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
