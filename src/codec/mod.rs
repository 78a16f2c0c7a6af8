//! Codec module - serialization for frame payloads.
//!
//! Every payload on the link, in both directions, is JSON text:
//!
//! - [`JsonCodec`] - `serde_json` encode/decode, mapping decode failures to framing errors
//!
//! # Example
//!
//! ```
//! use botwire::codec::JsonCodec;
//!
//! let encoded = JsonCodec::encode(&"hello").unwrap();
//! let decoded: String = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, "hello");
//! ```

mod json;

pub use json::JsonCodec;
