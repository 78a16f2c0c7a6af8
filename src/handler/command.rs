//! Decoding frames into commands.
//!
//! A command is a JSON object `{ "name": string, "args": object }`. Older
//! clients send the name under `cmd`, which is accepted as well.

use serde_json::Value;

use super::Args;
use crate::codec::JsonCodec;
use crate::error::{BotwireError, Result};
use crate::protocol::Frame;

/// A decoded command, not yet routed.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub args: Args,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Args) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Decode and validate a frame.
    ///
    /// # Errors
    ///
    /// [`BotwireError::Framing`] if the payload is not JSON,
    /// [`BotwireError::MissingName`] if there is no string name, and
    /// [`BotwireError::InvalidArgument`] if `args` is not an object.
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let value: Value = JsonCodec::decode(frame.payload())?;
        Self::from_value(value)
    }

    /// Validate an already decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut object = match value {
            Value::Object(object) => object,
            _ => return Err(BotwireError::MissingName),
        };

        let name = match object.remove("name").or_else(|| object.remove("cmd")) {
            Some(Value::String(name)) => name,
            _ => return Err(BotwireError::MissingName),
        };

        let args = match object.remove("args") {
            None | Some(Value::Null) => Args::new(),
            Some(Value::Object(map)) => Args::from_map(map),
            Some(_) => return Err(BotwireError::invalid_argument(&name, "args", "an object")),
        };

        Ok(Self { name, args })
    }
}
