//! Command registry for routing commands by channel and name.
//!
//! Every command belongs to exactly one channel. A name that is registered
//! on the other channel is treated as unknown, the same as a name that is
//! not registered at all.
//!
//! # Example
//!
//! ```
//! use botwire::handler::{completed, CommandRegistry, CommandSpec, Signature};
//! use botwire::transport::Channel;
//! use serde_json::json;
//!
//! let mut registry = CommandRegistry::standard();
//!
//! registry.register(CommandSpec::request("ping", &[], Signature::Sync, |_ctx, _args| {
//!     Ok(completed(json!("pong")))
//! }));
//!
//! assert!(registry.resolve(Channel::Request, "ping").is_ok());
//! assert!(registry.resolve(Channel::Command, "ping").is_err());
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use super::{commands, Args, HandlerContext};
use crate::error::{ActuatorResult, BotwireError, Result};
use crate::transport::Channel;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The rest of a command's work, after its handler returned.
pub type Completion = BoxFuture<'static, ActuatorResult<Value>>;

/// Handler entry point.
///
/// Protocol errors (bad argument types) and synchronous actuator failures
/// are returned directly; anything slower goes into the [`Completion`].
pub type InvokeFn = fn(&HandlerContext, &Args) -> Result<Completion>;

/// A completion that is already done.
pub fn completed(value: Value) -> Completion {
    Box::pin(std::future::ready(Ok(value)))
}

/// Whether a command's result is known when its handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// The result is computed inside the handler.
    Sync,
    /// The result arrives later from the actuator.
    Async,
}

/// Static description of one command.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Wire name, e.g. `"raiseArm"`.
    pub name: &'static str,
    pub channel: Channel,
    /// Argument keys that must be present before the handler runs.
    pub required_args: &'static [&'static str],
    pub signature: Signature,
    pub invoke: InvokeFn,
}

impl CommandSpec {
    /// A fire-and-forget command.
    pub const fn command(
        name: &'static str,
        required_args: &'static [&'static str],
        invoke: InvokeFn,
    ) -> Self {
        Self {
            name,
            channel: Channel::Command,
            required_args,
            signature: Signature::Sync,
            invoke,
        }
    }

    /// A request that produces a reply.
    pub const fn request(
        name: &'static str,
        required_args: &'static [&'static str],
        signature: Signature,
        invoke: InvokeFn,
    ) -> Self {
        Self {
            name,
            channel: Channel::Request,
            required_args,
            signature,
            invoke,
        }
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("channel", &self.channel)
            .field("required_args", &self.required_args)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Registry mapping command names to their specs.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandSpec>,
}

impl CommandRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in command.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for spec in commands::BUILTIN_COMMANDS {
            registry.register(*spec);
        }
        registry
    }

    /// Register a command, returning the spec it replaced.
    pub fn register(&mut self, spec: CommandSpec) -> Option<CommandSpec> {
        self.commands.insert(spec.name, spec)
    }

    /// Remove a command.
    pub fn unregister(&mut self, name: &str) -> Option<CommandSpec> {
        self.commands.remove(name)
    }

    /// Look up a command by name on any channel.
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    /// Route `name` arriving on `channel`.
    ///
    /// # Errors
    ///
    /// [`BotwireError::UnknownCommand`] if no command of that name exists on
    /// this channel.
    pub fn resolve(&self, channel: Channel, name: &str) -> Result<&CommandSpec> {
        self.commands
            .get(name)
            .filter(|spec| spec.channel == channel)
            .ok_or_else(|| BotwireError::UnknownCommand {
                name: name.to_string(),
                channel,
            })
    }

    /// Sorted names of the commands on `channel`.
    pub fn names(&self, channel: Channel) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .commands
            .values()
            .filter(|spec| spec.channel == channel)
            .map(|spec| spec.name)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
