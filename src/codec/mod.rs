//! External collaborators adapted into effect chains.
//!
//! Encoding, decoding and request/response transports all fail in ways a
//! chain should see as ordinary failures. They are wired in as fallible
//! transforms, so a decode error or a refused request short-circuits the
//! chain like any other error.

pub mod json;
mod transport;

pub use json::CodecError;
pub use transport::Transport;
