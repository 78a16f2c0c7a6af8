//! Link builder and connection façade.
//!
//! The [`LinkBuilder`] provides a fluent API for configuring the command set
//! and building the link. The [`Link`] is what the radio stack talks to:
//! 1. Characteristic writes go to [`Link::on_write`] and are answered with
//!    the returned [`Ack`]
//! 2. Subscribe/unsubscribe events go to the `subscribe_*`/`unsubscribe_*`
//!    methods with the sink notifications should be written to
//! 3. A central disconnecting goes to [`Link::disconnect`]
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use botwire::actuator::MockActuator;
//! use botwire::protocol::build_frame;
//! use botwire::{Ack, Link};
//!
//! #[tokio::main]
//! async fn main() -> botwire::Result<()> {
//!     let link = Link::builder(Arc::new(MockActuator::new()))
//!         .hostname("tjbot")
//!         .start()?;
//!
//!     let ack = link.on_command_write(&build_frame(br#"{"name":"wave"}"#));
//!     assert_eq!(ack, Ack::Success);
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::actuator::Actuator;
use crate::config::LinkConfig;
use crate::error::{BotwireError, Result};
use crate::gatt::Characteristic;
use crate::handler::{CommandRegistry, CommandSpec, Dispatcher, HandlerContext};
use crate::notify::{ListenChannel, ResponseChannel};
use crate::protocol::FrameBuffer;
use crate::transport::{Ack, Channel, NotifySink};
use crate::writer::{spawn_reply_writer, ReplyHandle};

/// Builder for configuring and creating a [`Link`].
pub struct LinkBuilder {
    actuator: Arc<dyn Actuator>,
    registry: CommandRegistry,
    config: LinkConfig,
}

impl LinkBuilder {
    /// Create a builder with every built-in command and default settings.
    pub fn new(actuator: Arc<dyn Actuator>) -> Self {
        Self {
            actuator,
            registry: CommandRegistry::standard(),
            config: LinkConfig::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: LinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the command set.
    pub fn registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add or replace a single command.
    pub fn command(mut self, spec: CommandSpec) -> Self {
        self.registry.register(spec);
        self
    }

    /// Set the host name used for the device name and image URLs.
    ///
    /// Default: `tjbot`
    pub fn hostname(mut self, hostname: &str) -> Self {
        self.config.hostname = hostname.to_string();
        self
    }

    /// Set the port photos are served from.
    ///
    /// Default: 9080
    pub fn image_port(mut self, port: u16) -> Self {
        self.config.image_port = port;
        self
    }

    /// Acknowledge malformed request writes positively.
    ///
    /// Default: false
    pub fn always_ack_requests(mut self, enabled: bool) -> Self {
        self.config.always_ack_requests = enabled;
        self
    }

    /// Build the link and start its reply writer.
    ///
    /// # Errors
    ///
    /// [`BotwireError::NoRuntime`] when called outside a tokio runtime.
    pub fn start(self) -> Result<Link> {
        Link::start(self.actuator, self.registry, self.config)
    }
}

/// A running link to one connected client.
pub struct Link {
    config: Arc<LinkConfig>,
    command_buffer: Mutex<FrameBuffer>,
    request_buffer: Mutex<FrameBuffer>,
    dispatcher: Dispatcher,
    response: Arc<ResponseChannel>,
    listen: Arc<ListenChannel>,
    replies: ReplyHandle,
    _writer_task: JoinHandle<()>,
}

impl Link {
    /// Create a new link builder.
    pub fn builder(actuator: Arc<dyn Actuator>) -> LinkBuilder {
        LinkBuilder::new(actuator)
    }

    fn start(
        actuator: Arc<dyn Actuator>,
        registry: CommandRegistry,
        config: LinkConfig,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| BotwireError::NoRuntime)?;
        let config = Arc::new(config);

        let response = Arc::new(ResponseChannel::new());
        let listen = Arc::new(ListenChannel::new(actuator.clone()));

        let (replies, writer_task) = spawn_reply_writer(response.clone(), &runtime);

        let ctx = HandlerContext::new(actuator, config.clone(), listen.clone(), runtime);
        let dispatcher = Dispatcher::new(Arc::new(registry), ctx, replies.clone());

        tracing::info!(
            device = config.device_name(),
            commands = dispatcher.registry().len(),
            "Link started"
        );

        Ok(Self {
            config,
            command_buffer: Mutex::new(FrameBuffer::new()),
            request_buffer: Mutex::new(FrameBuffer::new()),
            dispatcher,
            response,
            listen,
            replies,
            _writer_task: writer_task,
        })
    }

    /// Write to the fire-and-forget command characteristic.
    pub fn on_command_write(&self, fragment: &[u8]) -> Ack {
        self.write(Channel::Command, fragment)
    }

    /// Write to the request characteristic.
    pub fn on_request_write(&self, fragment: &[u8]) -> Ack {
        self.write(Channel::Request, fragment)
    }

    /// Write addressed by characteristic.
    ///
    /// Writes to notify-only characteristics are refused.
    pub fn on_write(&self, characteristic: Characteristic, fragment: &[u8]) -> Ack {
        match characteristic.write_channel() {
            Some(channel) => self.write(channel, fragment),
            None => {
                tracing::warn!(characteristic = %characteristic, "Write to notify-only characteristic");
                Ack::UnlikelyError
            }
        }
    }

    /// Feed one write fragment into `channel`.
    ///
    /// Every frame the fragment completes is dispatched before returning.
    /// The ack is negative if any of them was rejected, and positive while
    /// a frame is still incomplete so the client keeps sending.
    pub fn write(&self, channel: Channel, fragment: &[u8]) -> Ack {
        tracing::trace!(channel = %channel, len = fragment.len(), "Received fragment");

        let frames = lock(self.buffer(channel)).push(fragment);

        let mut ack = Ack::Success;
        for frame in &frames {
            tracing::debug!(channel = %channel, len = frame.len(), "Frame complete");
            let outcome = self.dispatcher.dispatch(frame, channel);
            if !self.dispatcher.acknowledge(channel, &outcome).is_success() {
                ack = Ack::UnlikelyError;
            }
        }
        ack
    }

    /// A client subscribed to the response characteristic.
    pub fn subscribe_response<S: NotifySink>(&self, max_value_size: usize, sink: S) {
        self.response.subscription().subscribe(max_value_size, sink);
    }

    pub fn unsubscribe_response(&self) {
        self.response.subscription().unsubscribe();
    }

    /// A client subscribed to the listen characteristic.
    pub fn subscribe_listen<S: NotifySink>(&self, max_value_size: usize, sink: S) {
        self.listen.subscription().subscribe(max_value_size, sink);
    }

    pub fn unsubscribe_listen(&self) {
        self.listen.subscription().unsubscribe();
    }

    /// Subscribe addressed by characteristic.
    ///
    /// Returns false for characteristics that do not notify.
    pub fn on_subscribe(
        &self,
        characteristic: Characteristic,
        max_value_size: usize,
        sink: Arc<dyn NotifySink>,
    ) -> bool {
        match characteristic {
            Characteristic::Response => self
                .response
                .subscription()
                .subscribe_shared(max_value_size, sink),
            Characteristic::Listen => self
                .listen
                .subscription()
                .subscribe_shared(max_value_size, sink),
            Characteristic::Command | Characteristic::Request => return false,
        }
        true
    }

    /// Unsubscribe addressed by characteristic.
    pub fn on_unsubscribe(&self, characteristic: Characteristic) {
        match characteristic {
            Characteristic::Response => self.unsubscribe_response(),
            Characteristic::Listen => self.unsubscribe_listen(),
            Characteristic::Command | Characteristic::Request => {}
        }
    }

    /// The client went away.
    ///
    /// Partial inbound frames are discarded and both subscriptions end.
    /// Requests still running complete, and their replies are dropped.
    pub fn disconnect(&self) {
        lock(&self.command_buffer).clear();
        lock(&self.request_buffer).clear();
        self.unsubscribe_response();
        self.unsubscribe_listen();
        tracing::info!("Client disconnected");
    }

    pub fn response(&self) -> &Arc<ResponseChannel> {
        &self.response
    }

    pub fn listen(&self) -> &Arc<ListenChannel> {
        &self.listen
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn registry(&self) -> &CommandRegistry {
        self.dispatcher.registry()
    }

    /// Advertised device name.
    pub fn device_name(&self) -> &str {
        self.config.device_name()
    }

    /// Replies queued or being delivered.
    pub fn pending_replies(&self) -> usize {
        self.replies.pending_count()
    }

    fn buffer(&self, channel: Channel) -> &Mutex<FrameBuffer> {
        match channel {
            Channel::Command => &self.command_buffer,
            Channel::Request => &self.request_buffer,
        }
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("device", &self.config.device_name())
            .field("response", &self.response)
            .field("listen", &self.listen)
            .finish_non_exhaustive()
    }
}

fn lock(buffer: &Mutex<FrameBuffer>) -> MutexGuard<'_, FrameBuffer> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::MockActuator;
    use crate::error::DeliveryError;
    use crate::protocol::build_frame;
    use bytes::Bytes;

    #[test]
    fn test_start_outside_runtime() {
        let result = Link::builder(Arc::new(MockActuator::new())).start();
        assert!(matches!(result, Err(BotwireError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_builder_settings() {
        let link = Link::builder(Arc::new(MockActuator::new()))
            .hostname("Workbench")
            .image_port(8080)
            .always_ack_requests(true)
            .start()
            .unwrap();

        assert_eq!(link.device_name(), "Workbench");
        assert_eq!(link.config().image_url(), "http://workbench.local:8080/photo.jpg");
        assert!(link.config().always_ack_requests);
        assert_eq!(link.registry().len(), 22);
    }

    #[tokio::test]
    async fn test_partial_frame_acks_positively() {
        let mock = Arc::new(MockActuator::new());
        let link = Link::builder(mock.clone()).start().unwrap();

        assert_eq!(link.on_command_write(br#"{"name":"#), Ack::Success);
        assert_eq!(mock.call_count(), 0);
        assert_eq!(link.on_command_write(b"\"wave\"}\0"), Ack::Success);
        assert_eq!(mock.calls_to("wave").len(), 1);
    }

    #[tokio::test]
    async fn test_channels_have_separate_buffers() {
        let mock = Arc::new(MockActuator::new());
        let link = Link::builder(mock.clone()).start().unwrap();

        link.on_command_write(br#"{"name":"ra"#);
        link.on_request_write(br#"{"name":"shineCo"#);
        link.on_command_write(b"iseArm\"}\0");

        assert_eq!(mock.calls_to("raiseArm").len(), 1);
        assert!(mock.calls_to("shineColors").is_empty());
    }

    #[tokio::test]
    async fn test_write_to_notify_characteristic_is_refused() {
        let mock = Arc::new(MockActuator::new());
        let link = Link::builder(mock.clone()).start().unwrap();

        let frame = build_frame(br#"{"name":"wave"}"#);
        assert_eq!(link.on_write(Characteristic::Listen, &frame), Ack::UnlikelyError);
        assert_eq!(link.on_write(Characteristic::Command, &frame), Ack::Success);
        assert_eq!(mock.calls_to("wave").len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_discards_partial_frames() {
        let mock = Arc::new(MockActuator::new());
        let link = Link::builder(mock.clone()).start().unwrap();
        link.subscribe_response(20, |_chunk: Bytes| Ok::<(), DeliveryError>(()));

        link.on_command_write(br#"{"name":"wa"#);
        link.disconnect();
        assert!(!link.response().subscription().is_subscribed());

        // The leftover "wa" must not be glued onto the next frame.
        assert_eq!(link.on_command_write(&build_frame(br#"{"name":"lowerArm"}"#)), Ack::Success);
        assert_eq!(mock.calls_to("lowerArm").len(), 1);
        assert!(mock.calls_to("wave").is_empty());
    }

    #[tokio::test]
    async fn test_one_fragment_with_good_and_bad_frames() {
        let mock = Arc::new(MockActuator::new());
        let link = Link::builder(mock.clone()).start().unwrap();

        let mut fragment = build_frame(br#"{"name":"wave"}"#);
        fragment.extend(build_frame(br#"{"name":"fly"}"#));

        assert_eq!(link.on_command_write(&fragment), Ack::UnlikelyError);
        assert_eq!(mock.calls_to("wave").len(), 1);
    }
}
