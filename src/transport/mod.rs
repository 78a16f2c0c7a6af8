//! Transport module - the seam with the radio collaborator.
//!
//! The radio owns advertising, connections and MTU negotiation. This crate
//! only sees:
//! - [`Channel`] - which write characteristic a fragment arrived on
//! - [`Ack`] - the result handed back for each write request
//! - [`NotifySink`] - where notification payloads go once a client subscribes

mod channel;
mod sink;

pub use channel::{Ack, Channel};
pub use sink::NotifySink;
