//! Handler module - command decoding, routing and execution.
//!
//! Provides:
//! - [`Command`] / [`Args`] - a decoded, validated frame
//! - [`CommandRegistry`] - maps command names to [`CommandSpec`]s per channel
//! - [`HandlerContext`] - what a handler gets to do its work
//! - [`Dispatcher`] - runs frames through the registry and routes results
//!
//! # Example
//!
//! ```
//! use botwire::handler::{completed, Args, CommandRegistry, CommandSpec, Completion, HandlerContext, Signature};
//! use botwire::error::Result;
//! use serde_json::json;
//!
//! fn battery(_ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
//!     Ok(completed(json!({ "percent": 87 })))
//! }
//!
//! let mut registry = CommandRegistry::standard();
//! registry.register(CommandSpec::request("battery", &[], Signature::Sync, battery));
//! ```

mod args;
mod command;
mod commands;
mod context;
mod dispatch;
mod registry;

pub use args::Args;
pub use command::Command;
pub use commands::{top_languages, BUILTIN_COMMANDS};
pub use context::HandlerContext;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use registry::{
    completed, BoxFuture, CommandRegistry, CommandSpec, Completion, InvokeFn, Signature,
};
