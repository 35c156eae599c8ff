//! JSON encoding and decoding.
//!
//! # Examples
//!
//! ```rust
//! use effectum::effect::Effect;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let outcome = Effect::pure(br#"{"name":"ada","age":36}"#.to_vec())
//!     .decode_json::<User>()
//!     .filter(|user| user.age > 20)
//!     .map(|user| user.name)
//!     .run();
//!
//! assert_eq!(outcome.unwrap(), Some("ada".to_string()));
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::effect::Effect;

/// A JSON codec failure.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input was not valid JSON for the requested type.
    #[error("failed to decode `{type_name}` from json")]
    Decode {
        /// The requested type.
        type_name: &'static str,
        /// The parser error.
        #[source]
        source: serde_json::Error,
    },
    /// The value could not be serialized.
    #[error("failed to encode `{type_name}` as json")]
    Encode {
        /// The value's type.
        type_name: &'static str,
        /// The serializer error.
        #[source]
        source: serde_json::Error,
    },
}

/// Decodes `bytes` as a `T`.
///
/// # Errors
///
/// [`CodecError::Decode`] if `bytes` is not valid JSON for `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|source| CodecError::Decode {
        type_name: std::any::type_name::<T>(),
        source,
    })
}

/// Encodes `value` as JSON bytes.
///
/// # Errors
///
/// [`CodecError::Encode`] if `value` cannot be serialized (for example a
/// map with non-string keys).
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|source| CodecError::Encode {
        type_name: std::any::type_name::<T>(),
        source,
    })
}

impl Effect<Vec<u8>> {
    /// Decodes the present bytes as a `T`; a decode error fails the chain.
    pub fn decode_json<T: DeserializeOwned + 'static>(self) -> Effect<T> {
        self.attempt_map(|bytes: Vec<u8>| decode::<T>(&bytes))
    }
}

impl<A: Serialize + 'static> Effect<A> {
    /// Encodes the present value as JSON bytes; an encode error fails the chain.
    pub fn encode_json(self) -> Effect<Vec<u8>> {
        self.attempt_map(|value: A| encode(&value))
    }
}
