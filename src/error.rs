//! Error types for botwire.
//!
//! Every failure is local to the processing of a single frame or a single
//! delivery. [`BotwireError::kind`] classifies an error into the layer that
//! produced it, which decides how it surfaces to the remote client.

use thiserror::Error;

use crate::transport::Channel;

/// Which layer of the protocol produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The frame could not be decoded at all.
    Framing,
    /// The frame decoded, but is not a routable, well-formed command.
    Protocol,
    /// The actuator rejected or failed the command.
    Actuator,
    /// A notification could not be delivered to the remote client.
    Delivery,
    /// Local runtime failure (serialization, missing executor, shutdown).
    Runtime,
}

/// Failure reported by the actuator collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActuatorError {
    message: String,
}

impl ActuatorError {
    /// Create an actuator error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message reported back to the client.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for ActuatorError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ActuatorError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Result type for actuator calls.
pub type ActuatorResult<T> = std::result::Result<T, ActuatorError>;

/// Failure to push a notification out over a subscribed characteristic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Nobody is subscribed to the notification channel.
    #[error("device is not subscribed to the {channel} channel")]
    NotSubscribed { channel: &'static str },

    /// The subscription changed while a chunked message was being written.
    #[error("{channel} subscription changed after {sent} of {total} chunks")]
    Interrupted {
        channel: &'static str,
        sent: usize,
        total: usize,
    },

    /// The radio refused the notification.
    #[error("{channel} notification failed: {message}")]
    Sink {
        channel: &'static str,
        message: String,
    },
}

impl DeliveryError {
    /// Attribute a failure reported by a sink to `channel`.
    ///
    /// A [`DeliveryError::Sink`] keeps its own message, so the channel is
    /// named once.
    pub fn on_channel(self, channel: &'static str) -> Self {
        let message = match self {
            Self::Sink { message, .. } => message,
            other => other.to_string(),
        };
        Self::Sink { channel, message }
    }
}

/// Main error type for all botwire operations.
#[derive(Debug, Error)]
pub enum BotwireError {
    /// Frame payload is not decodable JSON text.
    #[error("Could not decode JSON from packet: {0}")]
    Framing(String),

    /// Decoded frame has no command name.
    #[error("Expected 'name' in request")]
    MissingName,

    /// No handler is registered for the name on this channel.
    #[error("Unknown command received: {name}")]
    UnknownCommand { name: String, channel: Channel },

    /// One or more required arguments are absent.
    #[error("Expected '{}' in args", .missing.join("', '"))]
    MissingArguments {
        command: String,
        missing: Vec<String>,
    },

    /// An argument is present but has the wrong shape.
    #[error("Expected '{arg}' of '{command}' to be {expected}")]
    InvalidArgument {
        command: String,
        arg: String,
        expected: &'static str,
    },

    /// The actuator failed, synchronously or asynchronously.
    #[error(transparent)]
    Actuator(#[from] ActuatorError),

    /// The handler panicked instead of returning.
    #[error("Handler for '{command}' panicked")]
    HandlerPanicked { command: String },

    /// Notification delivery failed.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// JSON serialization error for an outbound value.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A link was started outside of a tokio runtime.
    #[error("No tokio runtime is available to run the link")]
    NoRuntime,

    /// The reply writer has shut down.
    #[error("Connection closed")]
    ConnectionClosed,
}

impl BotwireError {
    /// Classify this error by the layer that produced it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Framing(_) => ErrorKind::Framing,
            Self::MissingName
            | Self::UnknownCommand { .. }
            | Self::MissingArguments { .. }
            | Self::InvalidArgument { .. } => ErrorKind::Protocol,
            Self::Actuator(_) | Self::HandlerPanicked { .. } => ErrorKind::Actuator,
            Self::Delivery(_) => ErrorKind::Delivery,
            Self::Json(_) | Self::NoRuntime | Self::ConnectionClosed => ErrorKind::Runtime,
        }
    }

    /// Shorthand for an [`InvalidArgument`](Self::InvalidArgument) error.
    pub(crate) fn invalid_argument(command: &str, arg: &str, expected: &'static str) -> Self {
        Self::InvalidArgument {
            command: command.to_string(),
            arg: arg.to_string(),
            expected,
        }
    }
}

/// Result type alias using BotwireError.
pub type Result<T> = std::result::Result<T, BotwireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command_message_names_the_command() {
        let err = BotwireError::UnknownCommand {
            name: "doesNotExist".into(),
            channel: Channel::Request,
        };
        assert_eq!(err.to_string(), "Unknown command received: doesNotExist");
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_missing_arguments_message() {
        let err = BotwireError::MissingArguments {
            command: "translate".into(),
            missing: vec!["text".into(), "targetLanguage".into()],
        };
        assert_eq!(err.to_string(), "Expected 'text', 'targetLanguage' in args");
    }

    #[test]
    fn test_sink_error_names_its_channel_once() {
        let err = DeliveryError::Sink {
            channel: "notify",
            message: "receiver dropped".into(),
        }
        .on_channel("response");
        assert_eq!(err.to_string(), "response notification failed: receiver dropped");

        let err = DeliveryError::NotSubscribed { channel: "radio" }.on_channel("listen");
        assert_eq!(
            err.to_string(),
            "listen notification failed: device is not subscribed to the radio channel"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(BotwireError::Framing("x".into()).kind(), ErrorKind::Framing);
        assert_eq!(BotwireError::MissingName.kind(), ErrorKind::Protocol);
        assert_eq!(
            BotwireError::from(ActuatorError::new("servo jammed")).kind(),
            ErrorKind::Actuator
        );
        assert_eq!(
            BotwireError::from(DeliveryError::NotSubscribed { channel: "response" }).kind(),
            ErrorKind::Delivery
        );
        assert_eq!(BotwireError::NoRuntime.kind(), ErrorKind::Runtime);
    }

    #[test]
    fn test_actuator_error_is_transparent() {
        let err = BotwireError::from(ActuatorError::from("camera busy"));
        assert_eq!(err.to_string(), "camera busy");
    }
}
