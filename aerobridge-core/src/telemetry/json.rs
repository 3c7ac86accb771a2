//! The broadcast JSON document.
//!
//! One builder renders the snapshot into a reusable buffer; both fan-out
//! transports send the identical bytes, which is what guarantees payload
//! parity between TCP and WebSocket clients. Rendering is deterministic:
//! fields appear in registry order with fixed numeric formatting, so the
//! same snapshot always produces the same byte sequence.

use crate::codec::DataType;
use crate::registry::{Storage, TABLE};
use crate::snapshot::TelemetrySnapshot;
use std::fmt::Write;

/// Schema identifier in the document root.
pub const TELEMETRY_SCHEMA: &str = "aerofly-bridge-telemetry";
/// Schema version in the document root.
pub const SCHEMA_VERSION: u32 = 1;

/// Renders snapshots into line-delimited JSON telemetry documents.
pub struct JsonBuilder {
    buf: String,
}

impl JsonBuilder {
    pub fn new() -> Self {
        Self {
            // A full document with ~130 variables lands around 6 KiB.
            buf: String::with_capacity(16 * 1024),
        }
    }

    /// Build the document for the current snapshot state.
    ///
    /// Reads through the validity gate, renders into the internal buffer and
    /// returns the finished bytes, `\n`-terminated. No locks are held and
    /// no I/O happens here.
    pub fn build(&mut self, snapshot: &TelemetrySnapshot, broadcast_rate_hz: f64) -> &[u8] {
        snapshot.read_validated(|s| self.render(s, broadcast_rate_hz));
        self.buf.as_bytes()
    }

    fn render(&mut self, s: &TelemetrySnapshot, broadcast_rate_hz: f64) {
        let buf = &mut self.buf;
        buf.clear();

        let _ = write!(
            buf,
            "{{\"schema\":\"{TELEMETRY_SCHEMA}\",\"schema_version\":{SCHEMA_VERSION},\
             \"timestamp\":{},\"timestamp_unit\":\"microseconds\",\"data_valid\":{},\
             \"update_counter\":{},\"broadcast_rate_hz\":{:.1},\"variables\":{{",
            s.timestamp_us(),
            u32::from(s.is_valid()),
            s.update_counter(),
            broadcast_rate_hz,
        );

        let mut first = true;
        for (index, def) in TABLE.iter().enumerate() {
            match def.storage {
                Storage::Scalar => {
                    sep(buf, &mut first);
                    let value = s.scalar(index);
                    match def.data_type {
                        DataType::Int64 => {
                            let _ = write!(buf, "\"{}\":{}", def.name, value as i64);
                        }
                        DataType::Uint64 | DataType::Uint8 => {
                            let _ = write!(buf, "\"{}\":{}", def.name, value as u64);
                        }
                        _ => {
                            let _ = write!(buf, "\"{}\":{:.6}", def.name, value);
                        }
                    }
                }
                Storage::Vector2(field) => {
                    sep(buf, &mut first);
                    let v = s.vector2(field);
                    let _ = write!(
                        buf,
                        "\"{0}.X\":{1:.6},\"{0}.Y\":{2:.6}",
                        def.name, v.x, v.y
                    );
                }
                Storage::Vector3(field) => {
                    sep(buf, &mut first);
                    let v = s.vector3(field);
                    let _ = write!(
                        buf,
                        "\"{0}.X\":{1:.6},\"{0}.Y\":{2:.6},\"{0}.Z\":{3:.6}",
                        def.name, v.x, v.y, v.z
                    );
                }
                Storage::Str(field) => {
                    sep(buf, &mut first);
                    let _ = write!(buf, "\"{}\":", def.name);
                    write_json_string(buf, s.string(field));
                }
                Storage::MessageOnly => {}
            }
        }

        buf.push_str("}}\n");
    }
}

impl Default for JsonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn sep(buf: &mut String, first: &mut bool) {
    if !*first {
        buf.push(',');
    }
    *first = false;
}

/// Write a quoted JSON string. Snapshot strings are already sanitized to
/// printable ASCII, so only the quote and backslash need escaping.
fn write_json_string(buf: &mut String, text: &str) {
    buf.push('"');
    for c in text.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            _ => buf.push(c),
        }
    }
    buf.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_stream, message_hash, MessageValue, SimMessage};
    use crate::registry::registry;
    use crate::telemetry::decode_and_apply;

    fn snapshot_with(name: &str, value: f64) -> Box<TelemetrySnapshot> {
        let mut snapshot = TelemetrySnapshot::new();
        let stream = encode_stream(&[SimMessage::new(
            message_hash(name),
            0,
            MessageValue::Double(value),
        )]);
        decode_and_apply(&mut snapshot, &stream, 1_000);
        snapshot
    }

    #[test]
    fn test_document_shape() {
        let snapshot = snapshot_with("Aircraft.Altitude", 1066.8);
        let mut builder = JsonBuilder::new();
        let doc = std::str::from_utf8(builder.build(&snapshot, 50.0))
            .unwrap()
            .to_string();

        assert!(doc.starts_with("{\"schema\":\"aerofly-bridge-telemetry\""));
        assert!(doc.ends_with("}\n"));
        assert!(doc.contains("\"schema_version\":1"));
        assert!(doc.contains("\"timestamp\":1000"));
        assert!(doc.contains("\"timestamp_unit\":\"microseconds\""));
        assert!(doc.contains("\"data_valid\":1"));
        assert!(doc.contains("\"update_counter\":1"));
        assert!(doc.contains("\"broadcast_rate_hz\":50.0"));
    }

    #[test]
    fn test_altitude_formatting() {
        let snapshot = snapshot_with("Aircraft.Altitude", 1066.8);
        let mut builder = JsonBuilder::new();
        let doc = std::str::from_utf8(builder.build(&snapshot, 50.0))
            .unwrap()
            .to_string();
        assert!(doc.contains("\"Aircraft.Altitude\":1066.800000"));
    }

    #[test]
    fn test_consecutive_builds_are_identical() {
        let snapshot = snapshot_with("Aircraft.Altitude", 1066.8);
        let mut builder = JsonBuilder::new();
        let a = builder.build(&snapshot, 50.0).to_vec();
        let b = builder.build(&snapshot, 50.0).to_vec();
        assert_eq!(a, b);
    }

    #[test]
    fn test_nan_renders_as_zero() {
        let snapshot = snapshot_with("Aircraft.MachNumber", f64::NAN);
        let mut builder = JsonBuilder::new();
        let doc = std::str::from_utf8(builder.build(&snapshot, 50.0))
            .unwrap()
            .to_string();
        assert!(doc.contains("\"Aircraft.MachNumber\":0.000000"));
        assert!(!doc.contains("NaN"));
    }

    #[test]
    fn test_vectors_expand_to_components() {
        let mut snapshot = TelemetrySnapshot::new();
        let stream = encode_stream(&[SimMessage::new(
            message_hash("Aircraft.Position"),
            0,
            MessageValue::Vector3(crate::codec::Vector3::new(1.5, 2.5, 3.5)),
        )]);
        decode_and_apply(&mut snapshot, &stream, 1);

        let mut builder = JsonBuilder::new();
        let doc = std::str::from_utf8(builder.build(&snapshot, 50.0))
            .unwrap()
            .to_string();
        assert!(doc.contains("\"Aircraft.Position.X\":1.500000"));
        assert!(doc.contains("\"Aircraft.Position.Y\":2.500000"));
        assert!(doc.contains("\"Aircraft.Position.Z\":3.500000"));
    }

    #[test]
    fn test_strings_escaped() {
        let mut snapshot = TelemetrySnapshot::new();
        let stream = encode_stream(&[SimMessage::new(
            message_hash("Aircraft.Name"),
            0,
            MessageValue::Str(b"C172 \"Skyhawk\"".to_vec()),
        )]);
        decode_and_apply(&mut snapshot, &stream, 1);

        let mut builder = JsonBuilder::new();
        let doc = std::str::from_utf8(builder.build(&snapshot, 50.0))
            .unwrap()
            .to_string();
        assert!(doc.contains("\"Aircraft.Name\":\"C172 \\\"Skyhawk\\\"\""));
    }

    #[test]
    fn test_document_is_valid_json() {
        let snapshot = snapshot_with("Aircraft.Altitude", 1066.8);
        let mut builder = JsonBuilder::new();
        let doc = builder.build(&snapshot, 50.0).to_vec();

        let parsed: serde_json::Value = serde_json::from_slice(&doc).unwrap();
        assert_eq!(parsed["schema"], "aerofly-bridge-telemetry");
        assert_eq!(parsed["variables"]["Aircraft.Altitude"], 1066.8);
        assert!(parsed["variables"].as_object().unwrap().len() >= 100);
    }

    #[test]
    fn test_message_only_variables_absent() {
        let snapshot = snapshot_with("Aircraft.Altitude", 1.0);
        let mut builder = JsonBuilder::new();
        let doc = std::str::from_utf8(builder.build(&snapshot, 50.0))
            .unwrap()
            .to_string();
        assert!(!doc.contains("Navigation.NAV1FrequencySwap"));
    }

    #[test]
    fn test_registry_variables_present() {
        let snapshot = snapshot_with("Aircraft.Altitude", 1.0);
        let mut builder = JsonBuilder::new();
        let doc = std::str::from_utf8(builder.build(&snapshot, 50.0))
            .unwrap()
            .to_string();

        let reg = registry();
        for index in 0..reg.len() {
            let def = reg.def(index);
            if !matches!(def.storage, Storage::MessageOnly) {
                let key = match def.storage {
                    Storage::Vector2(_) | Storage::Vector3(_) => format!("\"{}.X\"", def.name),
                    _ => format!("\"{}\"", def.name),
                };
                assert!(doc.contains(&key), "missing {}", def.name);
            }
        }
    }
}
