//! Notification sinks.
//!
//! A sink is handed over by the radio when a client subscribes to a notify
//! characteristic, and taken away again on unsubscribe.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::DeliveryError;

/// Destination for one notification payload.
///
/// Implemented for closures and for unbounded `mpsc` senders, so a radio
/// binding can either push synchronously or hand payloads to its own task.
pub trait NotifySink: Send + Sync + 'static {
    /// Send one notification to the subscribed client.
    fn notify(&self, value: Bytes) -> Result<(), DeliveryError>;
}

impl<F> NotifySink for F
where
    F: Fn(Bytes) -> Result<(), DeliveryError> + Send + Sync + 'static,
{
    fn notify(&self, value: Bytes) -> Result<(), DeliveryError> {
        (self)(value)
    }
}

impl NotifySink for mpsc::UnboundedSender<Bytes> {
    fn notify(&self, value: Bytes) -> Result<(), DeliveryError> {
        self.send(value).map_err(|_| DeliveryError::Sink {
            channel: "notify",
            message: "receiver dropped".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let sink = move |value: Bytes| {
            seen_clone.lock().unwrap().push(value);
            Ok::<(), DeliveryError>(())
        };

        sink.notify(Bytes::from_static(b"one")).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_channel_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.notify(Bytes::from_static(b"chunk")).unwrap();
        assert_eq!(&rx.recv().await.unwrap()[..], b"chunk");
    }

    #[test]
    fn test_channel_sink_after_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel::<Bytes>();
        drop(rx);
        assert!(matches!(
            tx.notify(Bytes::from_static(b"lost")),
            Err(DeliveryError::Sink { .. })
        ));
    }
}
