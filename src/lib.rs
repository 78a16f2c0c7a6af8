//! # botwire
//!
//! Protocol core for driving a TJBot-style robot over Bluetooth LE.
//!
//! A connected client writes NUL-terminated JSON commands to one of two
//! write characteristics and reads results back over notifications.
//!
//! ## Architecture
//!
//! - **Command channel** (write): fire-and-forget commands, acknowledged only
//! - **Request channel** (write): commands whose result comes back on the
//!   response channel
//! - **Response channel** (notify): one reply per request, chunked to the
//!   negotiated size and closed with a `0x00` chunk
//! - **Listen channel** (notify): live speech-to-text, one item per
//!   notification
//!
//! The radio stack itself is not part of this crate: a host routes
//! characteristic events into a [`Link`] and supplies an
//! [`actuator::Actuator`] that drives the hardware.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use botwire::actuator::MockActuator;
//! use botwire::protocol::build_frame;
//! use botwire::{Ack, Link};
//! use bytes::Bytes;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> botwire::Result<()> {
//!     let link = Link::builder(Arc::new(MockActuator::new())).start()?;
//!
//!     let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
//!     link.subscribe_response(20, tx);
//!
//!     let ack = link.on_request_write(&build_frame(br#"{"name":"randomColor"}"#));
//!     assert_eq!(ack, Ack::Success);
//!
//!     let chunk = rx.recv().await.unwrap();
//!     assert_eq!(&chunk[..], b"\"blue\"");
//!     Ok(())
//! }
//! ```

pub mod actuator;
pub mod codec;
pub mod config;
pub mod error;
pub mod gatt;
pub mod handler;
pub mod notify;
pub mod protocol;
pub mod transport;
pub mod writer;

mod link;

pub use config::LinkConfig;
pub use error::{BotwireError, ErrorKind, Result};
pub use gatt::Characteristic;
pub use link::{Link, LinkBuilder};
pub use transport::{Ack, Channel, NotifySink};
