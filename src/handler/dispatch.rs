//! Routing decoded frames to handlers.
//!
//! The dispatcher runs inside the write callback and never waits on the
//! actuator. Validation and the synchronous part of a handler happen inline.
//! A [`Signature::Sync`] request is finished inline as well, so its reply is
//! queued in the same order as the frames around it. Any other
//! [`Completion`] is spawned and, on the request channel, queued on the reply
//! writer once it resolves.
//!
//! How a failure surfaces depends on where it happens:
//!
//! | failure                    | write ack   | request channel reply |
//! |----------------------------|-------------|-----------------------|
//! | framing / protocol         | negative    | `{ "error": .. }`     |
//! | actuator, synchronous      | positive    | `{ "error": .. }`     |
//! | actuator, asynchronous     | positive    | `{ "error": .. }`     |
//!
//! On the command channel nothing is ever replied; failures are logged.
//!
//! With `always_ack_requests`, a request frame that named a command is
//! acknowledged positively even when it is rejected. Frames that could not
//! be decoded, or carry no name, are still refused.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use serde_json::Value;

use super::registry::{Completion, Signature};
use super::{Command, CommandRegistry, HandlerContext};
use crate::error::{ActuatorResult, BotwireError, ErrorKind};
use crate::protocol::Frame;
use crate::transport::{Ack, Channel};
use crate::writer::{OutboundMessage, ReplyHandle};

/// What happened to one frame.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The command was validated and started.
    Accepted { command: &'static str },
    /// The command was valid but its handler failed before returning.
    Failed {
        command: &'static str,
        error: BotwireError,
    },
    /// The frame was not a valid command.
    Rejected { error: BotwireError },
}

impl DispatchOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// The error behind a failed or rejected frame.
    pub fn error(&self) -> Option<&BotwireError> {
        match self {
            Self::Accepted { .. } => None,
            Self::Failed { error, .. } | Self::Rejected { error } => Some(error),
        }
    }
}

/// Routes frames from either write channel to their handlers.
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    ctx: HandlerContext,
    replies: ReplyHandle,
    always_ack_requests: bool,
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>, ctx: HandlerContext, replies: ReplyHandle) -> Self {
        let always_ack_requests = ctx.config().always_ack_requests;
        Self {
            registry,
            ctx,
            replies,
            always_ack_requests,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Decode one frame and run the command it holds.
    pub fn dispatch(&self, frame: &Frame, channel: Channel) -> DispatchOutcome {
        match Command::from_frame(frame) {
            Ok(command) => self.dispatch_command(command, channel),
            Err(e) => self.reject(channel, "", e),
        }
    }

    /// Run an already decoded command.
    pub fn dispatch_command(&self, command: Command, channel: Channel) -> DispatchOutcome {
        let spec = match self.registry.resolve(channel, &command.name) {
            Ok(spec) => *spec,
            Err(e) => return self.reject(channel, &command.name, e),
        };

        let missing = command.args.missing(spec.required_args);
        if !missing.is_empty() {
            let error = BotwireError::MissingArguments {
                command: spec.name.to_string(),
                missing,
            };
            return self.reject(channel, spec.name, error);
        }

        tracing::debug!(command = spec.name, channel = %channel, "Dispatching");

        let invoked = catch_unwind(AssertUnwindSafe(|| (spec.invoke)(&self.ctx, &command.args)));
        let completion = match invoked {
            Ok(Ok(completion)) => completion,
            Ok(Err(e)) if e.kind() == ErrorKind::Protocol => {
                return self.reject(channel, spec.name, e)
            }
            Ok(Err(e)) => return self.fail(channel, spec.name, e),
            Err(_) => {
                let error = BotwireError::HandlerPanicked {
                    command: spec.name.to_string(),
                };
                return self.fail(channel, spec.name, error);
            }
        };

        if channel == Channel::Request && spec.signature == Signature::Sync {
            match catch_unwind(AssertUnwindSafe(|| poll_once(completion))) {
                Ok(Ok(Ok(value))) => {
                    tracing::debug!(command = spec.name, "Request completed");
                    self.reply_now(OutboundMessage::reply(spec.name, value));
                }
                Ok(Ok(Err(e))) => return self.fail(channel, spec.name, e.into()),
                Ok(Err(pending)) => self.complete_later(channel, spec.name, pending),
                Err(_) => {
                    let error = BotwireError::HandlerPanicked {
                        command: spec.name.to_string(),
                    };
                    return self.fail(channel, spec.name, error);
                }
            }
        } else {
            self.complete_later(channel, spec.name, completion);
        }
        DispatchOutcome::Accepted { command: spec.name }
    }

    /// The write acknowledgement for an outcome on `channel`.
    pub fn acknowledge(&self, channel: Channel, outcome: &DispatchOutcome) -> Ack {
        match outcome {
            DispatchOutcome::Accepted { .. } | DispatchOutcome::Failed { .. } => Ack::Success,
            DispatchOutcome::Rejected { error }
                if channel == Channel::Request
                    && self.always_ack_requests
                    && names_a_command(error) =>
            {
                Ack::Success
            }
            DispatchOutcome::Rejected { .. } => Ack::UnlikelyError,
        }
    }

    fn reject(&self, channel: Channel, command: &str, error: BotwireError) -> DispatchOutcome {
        tracing::warn!(channel = %channel, command, error = %error, "Rejected frame");
        if channel == Channel::Request {
            self.reply_now(OutboundMessage::error(command, &error));
        }
        DispatchOutcome::Rejected { error }
    }

    fn fail(&self, channel: Channel, command: &'static str, error: BotwireError) -> DispatchOutcome {
        tracing::error!(channel = %channel, command, error = %error, "Command failed");
        if channel == Channel::Request {
            self.reply_now(OutboundMessage::error(command, &error));
        }
        DispatchOutcome::Failed { command, error }
    }

    fn reply_now(&self, message: OutboundMessage) {
        if let Err(e) = self.replies.send(message) {
            tracing::error!(error = %e, "Failed to queue reply");
        }
    }

    /// Drive a completion to its end and route the result.
    ///
    /// The completion runs in its own task so that a panic inside it is
    /// reported as a failed command instead of taking the link down.
    fn complete_later(&self, channel: Channel, command: &'static str, completion: Completion) {
        let replies = self.replies.clone();
        let task = self.ctx.spawn(completion);

        self.ctx.spawn(async move {
            let result: Result<Value, BotwireError> = match task.await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(e.into()),
                Err(join) if join.is_panic() => Err(BotwireError::HandlerPanicked {
                    command: command.to_string(),
                }),
                Err(_) => Err(BotwireError::ConnectionClosed),
            };

            match (channel, result) {
                (Channel::Request, Ok(value)) => {
                    tracing::debug!(command, "Request completed");
                    if let Err(e) = replies.send(OutboundMessage::reply(command, value)) {
                        tracing::error!(command, error = %e, "Failed to queue reply");
                    }
                }
                (Channel::Request, Err(error)) => {
                    tracing::error!(command, error = %error, "Request failed");
                    if let Err(e) = replies.send(OutboundMessage::error(command, &error)) {
                        tracing::error!(command, error = %e, "Failed to queue error reply");
                    }
                }
                (Channel::Command, Ok(_)) => {
                    tracing::trace!(command, "Command completed");
                }
                (Channel::Command, Err(error)) => {
                    tracing::error!(command, error = %error, "Command failed");
                }
            }
        });
    }
}

/// Poll a completion once without a runtime waker.
///
/// Hands the completion back if it is not finished yet.
fn poll_once(mut completion: Completion) -> Result<ActuatorResult<Value>, Completion> {
    let mut cx = Context::from_waker(Waker::noop());
    match completion.as_mut().poll(&mut cx) {
        Poll::Ready(result) => Ok(result),
        Poll::Pending => Err(completion),
    }
}

/// True when the rejected frame got as far as naming a command.
fn names_a_command(error: &BotwireError) -> bool {
    error.kind() == ErrorKind::Protocol && !matches!(error, BotwireError::MissingName)
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("commands", &self.registry.len())
            .field("always_ack_requests", &self.always_ack_requests)
            .finish_non_exhaustive()
    }
}
