//! Dedicated writer task for request replies.
//!
//! Request handlers complete in any order and on any task. Instead of letting
//! each of them write to the response characteristic directly, replies are
//! queued on an mpsc channel consumed by a single writer task, which delivers
//! one reply in full (every chunk plus the terminator) before it picks up the
//! next.
//!
//! The queue is unbounded: a reply is queued from the write callback, which
//! must neither block nor drop the one reply a request is owed. The pending
//! counter shows how far the writer has fallen behind.
//!
//! # Architecture
//!
//! ```text
//! Request 1 ─┐
//! Request 2 ─┼─► mpsc::UnboundedSender<OutboundMessage> ─► Writer Task ─► ResponseChannel
//! Request N ─┘
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{BotwireError, Result};
use crate::notify::ResponseChannel;

/// A complete reply waiting for the response characteristic.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Command the reply answers, for logging.
    pub command: String,
    /// JSON value sent to the client.
    pub value: Value,
}

impl OutboundMessage {
    /// A successful reply.
    pub fn reply(command: impl Into<String>, value: Value) -> Self {
        Self {
            command: command.into(),
            value,
        }
    }

    /// An `{ "error": message }` reply.
    pub fn error(command: impl Into<String>, error: &BotwireError) -> Self {
        Self {
            command: command.into(),
            value: json!({ "error": error.to_string() }),
        }
    }
}

/// Handle for queueing replies on the writer task.
///
/// Cheaply cloneable; every in-flight request holds one.
#[derive(Clone)]
pub struct ReplyHandle {
    tx: mpsc::UnboundedSender<OutboundMessage>,
    pending: Arc<AtomicUsize>,
}

impl ReplyHandle {
    /// Queue a reply behind every reply queued before it.
    ///
    /// Never blocks, so it is safe to call from the write callback.
    pub fn send(&self, message: OutboundMessage) -> Result<()> {
        self.pending.fetch_add(1, Ordering::AcqRel);

        self.tx.send(message).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::Release);
            BotwireError::ConnectionClosed
        })
    }

    /// Replies queued or being delivered.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ReplyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyHandle")
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Spawn the writer task on `runtime` and return a handle for queueing replies.
///
/// The task ends once every [`ReplyHandle`] has been dropped and the queue
/// is drained.
pub fn spawn_reply_writer(
    response: Arc<ResponseChannel>,
    runtime: &Handle,
) -> (ReplyHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = Arc::new(AtomicUsize::new(0));

    let handle = ReplyHandle {
        tx,
        pending: pending.clone(),
    };
    let task = runtime.spawn(writer_loop(rx, response, pending));

    (handle, task)
}

/// Deliver queued replies one at a time.
///
/// A failed delivery loses that reply only.
async fn writer_loop(
    mut rx: mpsc::UnboundedReceiver<OutboundMessage>,
    response: Arc<ResponseChannel>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(message) = rx.recv().await {
        match response.deliver(&message.value) {
            Ok(chunks) => {
                tracing::debug!(command = %message.command, chunks, "Reply delivered");
            }
            Err(e) => {
                tracing::error!(command = %message.command, error = %e, "Dropping reply");
            }
        }
        pending.fetch_sub(1, Ordering::Release);
    }
    tracing::debug!("Reply writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::Duration;

    async fn settle(handle: &ReplyHandle) {
        for _ in 0..100 {
            if handle.pending_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("writer did not drain");
    }

    #[test]
    fn test_error_message_shape() {
        let msg = OutboundMessage::error("see", &BotwireError::MissingName);
        assert_eq!(msg.value, json!({ "error": "Expected 'name' in request" }));
        assert_eq!(msg.command, "see");
    }

    #[tokio::test]
    async fn test_replies_are_delivered_in_queue_order() {
        let response = Arc::new(ResponseChannel::new());
        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        response.subscription().subscribe(4, tx);

        let (handle, _task) = spawn_reply_writer(response, &Handle::current());
        handle
            .send(OutboundMessage::reply("a", json!("first")))
            .unwrap();
        handle
            .send(OutboundMessage::reply("b", json!("second")))
            .unwrap();
        settle(&handle).await;

        let mut received = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            received.extend_from_slice(&chunk);
        }
        // "first" is 7 bytes (2 chunks + terminator), "second" is 8 (2 + terminator)
        assert_eq!(received, b"\"first\"\0\"second\"\0");
    }

    #[tokio::test]
    async fn test_unsubscribed_reply_is_dropped() {
        let response = Arc::new(ResponseChannel::new());
        let (handle, _task) = spawn_reply_writer(response, &Handle::current());

        handle
            .send(OutboundMessage::reply("shineColors", json!(["red"])))
            .unwrap();
        settle(&handle).await;
        assert_eq!(handle.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_burst_of_replies_is_never_refused() {
        let response = Arc::new(ResponseChannel::new());
        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        response.subscription().subscribe(0, tx);

        let (handle, _task) = spawn_reply_writer(response, &Handle::current());
        for i in 0..200 {
            handle.send(OutboundMessage::reply("randomColor", json!(i))).unwrap();
        }
        settle(&handle).await;

        let mut replies = 0;
        while let Ok(chunk) = rx.try_recv() {
            if &chunk[..] == b"\0" {
                replies += 1;
            }
        }
        assert_eq!(replies, 200);
    }

    #[tokio::test]
    async fn test_send_after_writer_stopped() {
        let response = Arc::new(ResponseChannel::new());
        let (handle, task) = spawn_reply_writer(response, &Handle::current());
        task.abort();
        let _ = task.await;

        let err = handle
            .send(OutboundMessage::reply("x", Value::Null))
            .unwrap_err();
        assert!(matches!(err, BotwireError::ConnectionClosed));
        assert_eq!(handle.pending_count(), 0);
    }
}
