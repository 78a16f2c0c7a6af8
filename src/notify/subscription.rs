//! Per-characteristic subscription state.
//!
//! ```text
//! Unsubscribed ──subscribe(max, sink)──► Subscribed
//!      ▲                                     │
//!      └────────────unsubscribe()────────────┘
//! ```
//!
//! Every transition bumps a generation counter. A delivery captures the
//! generation when it starts and checks it before each chunk, so a
//! subscribe or unsubscribe racing a delivery makes that delivery fail
//! cleanly instead of splicing chunks into a different subscription.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::transport::NotifySink;

/// Observable state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    Subscribed {
        /// Negotiated maximum notification size; zero means unlimited.
        max_chunk_size: usize,
    },
}

struct Inner {
    sink: Option<Arc<dyn NotifySink>>,
    max_chunk_size: usize,
    generation: u64,
}

/// Snapshot of a live subscription, taken at the start of a delivery.
pub(crate) struct Active {
    pub(crate) sink: Arc<dyn NotifySink>,
    pub(crate) max_chunk_size: usize,
    pub(crate) generation: u64,
}

/// Shared subscription slot for one notify characteristic.
///
/// Cheap to clone; clones observe the same state.
#[derive(Clone)]
pub struct Subscription {
    name: &'static str,
    inner: Arc<Mutex<Inner>>,
}

impl Subscription {
    /// Create an unsubscribed slot for the named characteristic.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(Inner {
                sink: None,
                max_chunk_size: 0,
                generation: 0,
            })),
        }
    }

    /// Characteristic name, used in logs and errors.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A client subscribed with the given negotiated maximum value size.
    pub fn subscribe<S: NotifySink>(&self, max_value_size: usize, sink: S) {
        self.subscribe_shared(max_value_size, Arc::new(sink));
    }

    /// Like [`subscribe`](Self::subscribe), for an already shared sink.
    pub fn subscribe_shared(&self, max_value_size: usize, sink: Arc<dyn NotifySink>) {
        let mut inner = self.lock();
        inner.sink = Some(sink);
        inner.max_chunk_size = max_value_size;
        inner.generation += 1;
        tracing::info!(
            channel = self.name,
            max_value_size,
            "Device subscribed"
        );
    }

    /// The client unsubscribed, or the connection went away.
    pub fn unsubscribe(&self) {
        let mut inner = self.lock();
        let was_subscribed = inner.sink.take().is_some();
        inner.max_chunk_size = 0;
        inner.generation += 1;
        if was_subscribed {
            tracing::info!(channel = self.name, "Device unsubscribed");
        }
    }

    /// Current state.
    pub fn state(&self) -> SubscriptionState {
        let inner = self.lock();
        match inner.sink {
            Some(_) => SubscriptionState::Subscribed {
                max_chunk_size: inner.max_chunk_size,
            },
            None => SubscriptionState::Unsubscribed,
        }
    }

    /// True while a client is subscribed.
    pub fn is_subscribed(&self) -> bool {
        self.lock().sink.is_some()
    }

    /// Negotiated maximum notification size; zero when unsubscribed.
    pub fn max_chunk_size(&self) -> usize {
        self.lock().max_chunk_size
    }

    pub(crate) fn active(&self) -> Option<Active> {
        let inner = self.lock();
        inner.sink.as_ref().map(|sink| Active {
            sink: Arc::clone(sink),
            max_chunk_size: inner.max_chunk_size,
            generation: inner.generation,
        })
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}
