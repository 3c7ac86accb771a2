//! Simulator message codec.
//!
//! The host delivers telemetry as a packed little-endian byte stream and
//! accepts commands in the same encoding. Each message is identified by the
//! 64-bit hash of its dotted variable name; the registry maps hashes back to
//! logical indices.

pub mod hash;
pub mod types;
pub mod wire;

pub use hash::message_hash;
pub use types::{DataType, MessageValue, Vector2, Vector3, Vector4};
pub use wire::{decode_message, encode_message, encode_stream, SimMessage};
