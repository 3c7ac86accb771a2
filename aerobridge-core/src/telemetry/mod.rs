//! Telemetry path: decoding host messages into the snapshot and rendering
//! the snapshot as the broadcast JSON document.

pub mod decoder;
pub mod json;

pub use decoder::decode_and_apply;
pub use json::{JsonBuilder, SCHEMA_VERSION, TELEMETRY_SCHEMA};
