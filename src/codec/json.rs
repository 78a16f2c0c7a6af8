//! JSON codec using `serde_json`.
//!
//! Serialized JSON never contains a raw NUL byte: a NUL inside a string is
//! always escaped as `\u0000`. That is what makes the single terminator byte
//! a safe delimiter without a length prefix.
//!
//! # Example
//!
//! ```
//! use botwire::codec::JsonCodec;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Reply {
//!     message: String,
//! }
//!
//! let reply = Reply { message: "hi".to_string() };
//! let encoded = JsonCodec::encode(&reply).unwrap();
//! let decoded: Reply = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, reply);
//! ```

use crate::error::{BotwireError, Result};

/// JSON codec for frame payloads.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to compact JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    /// Decode JSON bytes received in a frame.
    ///
    /// Decode failures are framing errors: the bytes between two terminators
    /// were not a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`BotwireError::Framing`] for empty, non-UTF-8 or malformed
    /// payloads, or payloads that do not match `T`.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        if bytes.is_empty() {
            return Err(BotwireError::Framing("empty frame".to_string()));
        }
        serde_json::from_slice(bytes).map_err(|e| {
            BotwireError::Framing(format!("{} ({})", String::from_utf8_lossy(bytes), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::protocol::TERMINATOR;
    use serde_json::{json, Value};

    #[test]
    fn test_encode_is_compact() {
        let encoded = JsonCodec::encode(&json!({ "message": "hi" })).unwrap();
        assert_eq!(encoded, br#"{"message":"hi"}"#);
    }

    #[test]
    fn test_encoded_nul_is_escaped() {
        let encoded = JsonCodec::encode(&"a\0b").unwrap();
        assert!(!encoded.contains(&TERMINATOR));
        let decoded: String = JsonCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, "a\0b");
    }

    #[test]
    fn test_decode_garbage_is_framing_error() {
        let err = JsonCodec::decode::<Value>(b"{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);
        assert!(err.to_string().contains("{not json"));
    }

    #[test]
    fn test_decode_empty_is_framing_error() {
        let err = JsonCodec::decode::<Value>(b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);
    }

    #[test]
    fn test_decode_invalid_utf8_is_framing_error() {
        let err = JsonCodec::decode::<Value>(b"\"\xff\xfe\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);
    }
}
