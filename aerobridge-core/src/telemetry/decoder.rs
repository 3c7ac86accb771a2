//! Per-tick message decoding.
//!
//! The whole host byte stream is applied inside one validity-gate window:
//! `data_valid` drops at the start of the tick and the header is stamped on
//! commit, so external readers never observe a half-applied tick. Unknown
//! message ids are skipped silently (the simulator emits far more than the
//! registry tracks); malformed frames drop the remainder of the stream.

use crate::codec::{decode_message, MessageValue, SimMessage};
use crate::registry::{registry, PrimaryFlag, Storage};
use crate::snapshot::TelemetrySnapshot;
use tracing::debug;

/// Decode the host stream and apply every message to the snapshot.
pub fn decode_and_apply(snapshot: &mut TelemetrySnapshot, bytes: &[u8], now_us: u64) {
    snapshot.begin_update();

    let mut offset = 0;
    while offset < bytes.len() {
        match decode_message(&bytes[offset..]) {
            Some((msg, consumed)) => {
                apply_message(snapshot, &msg);
                offset += consumed;
            }
            None => {
                debug!(
                    offset,
                    remaining = bytes.len() - offset,
                    "malformed simulator message, dropping rest of stream"
                );
                break;
            }
        }
    }

    snapshot.commit_update(now_us);
}

/// Apply one decoded message. Dispatch is O(1): hash to index through the
/// registry, then a match on the descriptor's storage class.
fn apply_message(snapshot: &mut TelemetrySnapshot, msg: &SimMessage) {
    let reg = registry();
    let Some(index) = reg.index_of_hash(msg.id) else {
        return;
    };
    let def = reg.def(index);

    match def.storage {
        Storage::Scalar => {
            let Some(value) = msg.value.as_f64() else {
                debug!(
                    name = def.name,
                    got = %msg.data_type(),
                    "non-numeric payload for scalar variable"
                );
                return;
            };
            if def.flag == PrimaryFlag::Step {
                snapshot.apply_step(index, value);
            } else {
                snapshot.set_scalar(index, value);
            }
        }
        Storage::Vector2(field) => match msg.value {
            MessageValue::Vector2(v) => snapshot.set_vector2(field, v),
            _ => debug!(name = def.name, "expected vector2d payload"),
        },
        Storage::Vector3(field) => match msg.value {
            MessageValue::Vector3(v) => snapshot.set_vector3(field, v),
            _ => debug!(name = def.name, "expected vector3d payload"),
        },
        Storage::Str(field) => match &msg.value {
            MessageValue::Str(bytes) => snapshot.set_string(field, bytes),
            _ => debug!(name = def.name, "expected string payload"),
        },
        Storage::MessageOnly => {}
    }
}
