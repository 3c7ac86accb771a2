//! Binary message framing.
//!
//! Frame layout, little-endian:
//!
//! ```text
//! [len: u32] [id: u64] [data_type: u32] [flags: u32] [payload: len - 20 bytes]
//! ```
//!
//! `len` covers the whole frame including itself. Fixed-size payloads are
//! checked against the declared data type; string payloads take whatever
//! remains. Decoding is tolerant: a malformed frame yields `None` and the
//! caller decides whether to resync or stop.

use super::types::{DataType, MessageValue, Vector2, Vector3, Vector4};

/// Header bytes preceding the payload: len + id + data_type + flags.
pub const FRAME_HEADER_LEN: usize = 4 + 8 + 4 + 4;

/// Upper bound on a single frame, a guard against corrupt length prefixes.
pub const MAX_FRAME_LEN: usize = 4096;

/// One simulator message: identifier hash, wire flags, typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SimMessage {
    /// 64-bit hash of the dotted variable name.
    pub id: u64,
    /// Flag bits carried opaquely between host and bridge.
    pub flags: u32,
    pub value: MessageValue,
}

impl SimMessage {
    pub fn new(id: u64, flags: u32, value: MessageValue) -> Self {
        Self { id, flags, value }
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.value.data_type()
    }
}

#[inline]
fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

#[inline]
fn read_u64(bytes: &[u8], at: usize) -> u64 {
    u64::from_le_bytes(bytes[at..at + 8].try_into().unwrap())
}

#[inline]
fn read_f64(bytes: &[u8], at: usize) -> f64 {
    f64::from_le_bytes(bytes[at..at + 8].try_into().unwrap())
}

/// Decode one message from the front of `bytes`.
///
/// Returns the message and the number of bytes consumed, or `None` when the
/// buffer holds no complete, well-formed frame.
pub fn decode_message(bytes: &[u8]) -> Option<(SimMessage, usize)> {
    if bytes.len() < FRAME_HEADER_LEN {
        return None;
    }
    let len = read_u32(bytes, 0) as usize;
    if len < FRAME_HEADER_LEN || len > MAX_FRAME_LEN || len > bytes.len() {
        return None;
    }
    let id = read_u64(bytes, 4);
    let data_type = DataType::from_wire(read_u32(bytes, 12))?;
    let flags = read_u32(bytes, 16);
    let payload = &bytes[FRAME_HEADER_LEN..len];

    if let Some(expected) = data_type.payload_len() {
        if payload.len() != expected {
            return None;
        }
    }

    let value = match data_type {
        DataType::None => MessageValue::None,
        DataType::Double => MessageValue::Double(read_f64(payload, 0)),
        DataType::Int64 => MessageValue::Int64(read_u64(payload, 0) as i64),
        DataType::Uint64 => MessageValue::Uint64(read_u64(payload, 0)),
        DataType::Uint8 => MessageValue::Uint8(payload[0]),
        DataType::Float => {
            MessageValue::Float(f32::from_le_bytes(payload[0..4].try_into().unwrap()))
        }
        DataType::Vector2d => {
            MessageValue::Vector2(Vector2::new(read_f64(payload, 0), read_f64(payload, 8)))
        }
        DataType::Vector3d => MessageValue::Vector3(Vector3::new(
            read_f64(payload, 0),
            read_f64(payload, 8),
            read_f64(payload, 16),
        )),
        DataType::Vector4d => MessageValue::Vector4(Vector4::new(
            read_f64(payload, 0),
            read_f64(payload, 8),
            read_f64(payload, 16),
            read_f64(payload, 24),
        )),
        DataType::String => MessageValue::Str(payload.to_vec()),
    };

    Some((SimMessage { id, flags, value }, len))
}

/// Append one encoded message to `out`.
pub fn encode_message(msg: &SimMessage, out: &mut Vec<u8>) {
    let start = out.len();
    out.extend_from_slice(&0u32.to_le_bytes()); // length patched below
    out.extend_from_slice(&msg.id.to_le_bytes());
    out.extend_from_slice(&(msg.data_type() as u32).to_le_bytes());
    out.extend_from_slice(&msg.flags.to_le_bytes());

    match &msg.value {
        MessageValue::None => {}
        MessageValue::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
        MessageValue::Int64(v) => out.extend_from_slice(&v.to_le_bytes()),
        MessageValue::Uint64(v) => out.extend_from_slice(&v.to_le_bytes()),
        MessageValue::Uint8(v) => out.push(*v),
        MessageValue::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
        MessageValue::Vector2(v) => {
            out.extend_from_slice(&v.x.to_le_bytes());
            out.extend_from_slice(&v.y.to_le_bytes());
        }
        MessageValue::Vector3(v) => {
            out.extend_from_slice(&v.x.to_le_bytes());
            out.extend_from_slice(&v.y.to_le_bytes());
            out.extend_from_slice(&v.z.to_le_bytes());
        }
        MessageValue::Vector4(v) => {
            out.extend_from_slice(&v.x.to_le_bytes());
            out.extend_from_slice(&v.y.to_le_bytes());
            out.extend_from_slice(&v.z.to_le_bytes());
            out.extend_from_slice(&v.w.to_le_bytes());
        }
        MessageValue::Str(bytes) => out.extend_from_slice(bytes),
    }

    let len = (out.len() - start) as u32;
    out[start..start + 4].copy_from_slice(&len.to_le_bytes());
}

/// Encode a list of messages into one contiguous stream.
pub fn encode_stream(messages: &[SimMessage]) -> Vec<u8> {
    let mut out = Vec::with_capacity(messages.len() * 32);
    for msg in messages {
        encode_message(msg, &mut out);
    }
    out
}
