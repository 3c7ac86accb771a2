//! Wire-level value types shared by the codec and the snapshot layout.

use serde::Serialize;
use std::fmt;

/// Data type carried by a simulator message.
///
/// Single byte on the wire (widened to u32 in the header for alignment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum DataType {
    None = 0,
    Double = 1,
    Int64 = 2,
    Uint64 = 3,
    Uint8 = 4,
    Float = 5,
    Vector2d = 6,
    Vector3d = 7,
    Vector4d = 8,
    String = 9,
}

impl DataType {
    /// Decode from the wire header. Unknown values are rejected.
    pub fn from_wire(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => DataType::None,
            1 => DataType::Double,
            2 => DataType::Int64,
            3 => DataType::Uint64,
            4 => DataType::Uint8,
            5 => DataType::Float,
            6 => DataType::Vector2d,
            7 => DataType::Vector3d,
            8 => DataType::Vector4d,
            9 => DataType::String,
            _ => return None,
        })
    }

    /// Payload size in bytes, or `None` for variable-length payloads.
    pub fn payload_len(self) -> Option<usize> {
        Some(match self {
            DataType::None => 0,
            DataType::Double | DataType::Int64 | DataType::Uint64 => 8,
            DataType::Uint8 => 1,
            DataType::Float => 4,
            DataType::Vector2d => 16,
            DataType::Vector3d => 24,
            DataType::Vector4d => 32,
            DataType::String => return None,
        })
    }

    /// Wire payload for a numeric command aimed at a variable of this type.
    /// Vector and string variables do not accept numeric commands.
    pub fn numeric_payload(self, value: f64) -> Option<MessageValue> {
        Some(match self {
            DataType::Double => MessageValue::Double(value),
            DataType::Int64 => MessageValue::Int64(value as i64),
            DataType::Uint64 => MessageValue::Uint64(value.max(0.0) as u64),
            DataType::Uint8 => MessageValue::Uint8(value.clamp(0.0, 255.0) as u8),
            DataType::Float => MessageValue::Float(value as f32),
            _ => return None,
        })
    }

    /// True for types stored in the snapshot's scalar array.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            DataType::Double
                | DataType::Int64
                | DataType::Uint64
                | DataType::Uint8
                | DataType::Float
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::None => "none",
            DataType::Double => "double",
            DataType::Int64 => "int64",
            DataType::Uint64 => "uint64",
            DataType::Uint8 => "uint8",
            DataType::Float => "float",
            DataType::Vector2d => "vector2d",
            DataType::Vector3d => "vector3d",
            DataType::Vector4d => "vector4d",
            DataType::String => "string",
        };
        f.write_str(s)
    }
}

/// Two-component double vector (e.g. a lat/lon pair).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

/// Three-component double vector (world position, velocity, wind, ...).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Four-component double vector (quaternions and similar).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Vector4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Vector2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Vector4 {
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

/// Decoded message payload.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageValue {
    None,
    Double(f64),
    Int64(i64),
    Uint64(u64),
    Uint8(u8),
    Float(f32),
    Vector2(Vector2),
    Vector3(Vector3),
    Vector4(Vector4),
    Str(Vec<u8>),
}

impl MessageValue {
    /// Numeric view of the payload, for scalar storage and step deltas.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MessageValue::Double(v) => Some(*v),
            MessageValue::Int64(v) => Some(*v as f64),
            MessageValue::Uint64(v) => Some(*v as f64),
            MessageValue::Uint8(v) => Some(f64::from(*v)),
            MessageValue::Float(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            MessageValue::None => DataType::None,
            MessageValue::Double(_) => DataType::Double,
            MessageValue::Int64(_) => DataType::Int64,
            MessageValue::Uint64(_) => DataType::Uint64,
            MessageValue::Uint8(_) => DataType::Uint8,
            MessageValue::Float(_) => DataType::Float,
            MessageValue::Vector2(_) => DataType::Vector2d,
            MessageValue::Vector3(_) => DataType::Vector3d,
            MessageValue::Vector4(_) => DataType::Vector4d,
            MessageValue::Str(_) => DataType::String,
        }
    }
}
