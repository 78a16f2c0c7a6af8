//! Notify module - outbound paths to the client.
//!
//! - [`Subscription`] - subscribe/unsubscribe state of one notify characteristic
//! - [`ResponseChannel`] - complete, chunked, terminated replies
//! - [`ListenChannel`] - one notification per transcript item

mod listen;
mod response;
mod subscription;

pub use listen::{ListenChannel, LISTEN_CHANNEL};
pub use response::{ResponseChannel, RESPONSE_CHANNEL};
pub use subscription::{Subscription, SubscriptionState};
