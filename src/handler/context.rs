//! Context passed to command handlers.
//!
//! Gives a handler what it needs to start work and nothing more: the
//! actuator, the link configuration, the listen stream, and the runtime to
//! spawn background work on.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::actuator::Actuator;
use crate::config::LinkConfig;
use crate::notify::ListenChannel;

/// Shared state for handlers.
///
/// `HandlerContext` is `Clone` and cheap to clone; every field is shared.
#[derive(Clone)]
pub struct HandlerContext {
    actuator: Arc<dyn Actuator>,
    config: Arc<LinkConfig>,
    listen: Arc<ListenChannel>,
    runtime: Handle,
}

impl HandlerContext {
    /// Create a new handler context.
    pub fn new(
        actuator: Arc<dyn Actuator>,
        config: Arc<LinkConfig>,
        listen: Arc<ListenChannel>,
        runtime: Handle,
    ) -> Self {
        Self {
            actuator,
            config,
            listen,
            runtime,
        }
    }

    /// The actuator, shared so it can move into a completion future.
    #[inline]
    pub fn actuator(&self) -> Arc<dyn Actuator> {
        Arc::clone(&self.actuator)
    }

    #[inline]
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// The listen stream writer.
    #[inline]
    pub fn listen(&self) -> Arc<ListenChannel> {
        Arc::clone(&self.listen)
    }

    /// Spawn background work on the link's runtime.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(future)
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("config", &self.config)
            .field("listen", &self.listen)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::MockActuator;

    #[tokio::test]
    async fn test_context_is_clone() {
        let mock: Arc<dyn Actuator> = Arc::new(MockActuator::new());
        let listen = Arc::new(ListenChannel::new(mock.clone()));
        let ctx = HandlerContext::new(mock, Arc::default(), listen, Handle::current());
        let ctx2 = ctx.clone();

        assert_eq!(ctx.config(), ctx2.config());
        assert!(Arc::ptr_eq(&ctx.listen(), &ctx2.listen()));
    }

    #[tokio::test]
    async fn test_spawn_runs_on_runtime() {
        let mock: Arc<dyn Actuator> = Arc::new(MockActuator::new());
        let listen = Arc::new(ListenChannel::new(mock.clone()));
        let ctx = HandlerContext::new(mock, Arc::default(), listen, Handle::current());

        let value = ctx.spawn(async { 40 + 2 }).await.unwrap();
        assert_eq!(value, 42);
    }
}
