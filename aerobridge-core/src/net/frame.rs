//! RFC 6455 frame codec.
//!
//! Only what the fan-out needs: parsing masked client frames and encoding
//! unmasked single-fragment server frames. No compression, no subprotocols,
//! no server-side fragmentation.

use std::fmt;

/// Largest client payload the server will accept.
pub const MAX_CLIENT_PAYLOAD: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xa,
}

impl Opcode {
    fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0x0 => Opcode::Continuation,
            0x1 => Opcode::Text,
            0x2 => Opcode::Binary,
            0x8 => Opcode::Close,
            0x9 => Opcode::Ping,
            0xa => Opcode::Pong,
            _ => return None,
        })
    }
}

/// One parsed client frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    pub payload: Vec<u8>,
}

/// Protocol violations that terminate the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Client frames MUST be masked (RFC 6455 §5.1).
    Unmasked,
    UnknownOpcode(u8),
    PayloadTooLarge(u64),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Unmasked => write!(f, "client frame is not masked"),
            FrameError::UnknownOpcode(op) => write!(f, "unknown opcode {op:#x}"),
            FrameError::PayloadTooLarge(len) => {
                write!(f, "payload of {len} bytes exceeds limit")
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// Parse one client frame from the front of `buf`.
///
/// `Ok(None)` means the buffer does not yet hold a complete frame; the
/// caller keeps accumulating. `Ok(Some((frame, consumed)))` hands back the
/// unmasked frame and how many bytes it occupied.
pub fn parse_client_frame(buf: &[u8]) -> Result<Option<(Frame, usize)>, FrameError> {
    if buf.len() < 2 {
        return Ok(None);
    }

    let fin = buf[0] & 0x80 != 0;
    let opcode = Opcode::from_bits(buf[0] & 0x0f).ok_or(FrameError::UnknownOpcode(buf[0] & 0x0f))?;
    let masked = buf[1] & 0x80 != 0;
    if !masked {
        return Err(FrameError::Unmasked);
    }

    let (payload_len, mut offset) = match buf[1] & 0x7f {
        126 => {
            if buf.len() < 4 {
                return Ok(None);
            }
            (u64::from(u16::from_be_bytes([buf[2], buf[3]])), 4)
        }
        127 => {
            if buf.len() < 10 {
                return Ok(None);
            }
            (u64::from_be_bytes(buf[2..10].try_into().unwrap()), 10)
        }
        n => (u64::from(n), 2),
    };

    if payload_len > MAX_CLIENT_PAYLOAD as u64 {
        return Err(FrameError::PayloadTooLarge(payload_len));
    }
    let payload_len = payload_len as usize;

    if buf.len() < offset + 4 + payload_len {
        return Ok(None);
    }
    let mask: [u8; 4] = buf[offset..offset + 4].try_into().unwrap();
    offset += 4;

    let mut payload = buf[offset..offset + payload_len].to_vec();
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }

    Ok(Some((
        Frame {
            fin,
            opcode,
            payload,
        },
        offset + payload_len,
    )))
}

/// Encode an unmasked server frame (FIN = 1).
pub fn encode_server_frame(opcode: Opcode, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 10);
    out.push(0x80 | opcode as u8);
    match payload.len() {
        len if len < 126 => out.push(len as u8),
        len if len <= u16::MAX as usize => {
            out.push(126);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        }
        len => {
            out.push(127);
            out.extend_from_slice(&(len as u64).to_be_bytes());
        }
    }
    out.extend_from_slice(payload);
    out
}

/// Encode a text frame (the broadcast path).
#[inline]
pub fn encode_text(payload: &[u8]) -> Vec<u8> {
    encode_server_frame(Opcode::Text, payload)
}
