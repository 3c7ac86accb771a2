//! Command ingress: JSON commands from the network channels become
//! simulator messages on the next host tick.
//!
//! Each network server owns an unbounded lock-free queue of raw command
//! strings; the host thread drains them in FIFO order (TCP channel first,
//! then WebSocket) and translates each into a wire message. Bad input never
//! produces a message and never reaches the host as an error.

use crate::codec::SimMessage;
use crate::registry::{registry, PrimaryFlag};
use crate::snapshot::TelemetrySnapshot;
use crossbeam::queue::SegQueue;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Shared handle to one channel's command queue.
pub type CommandQueue = Arc<SegQueue<String>>;

/// A fresh, empty queue.
pub fn command_queue() -> CommandQueue {
    Arc::new(SegQueue::new())
}

/// A validated `{"variable": ..., "value": ...}` command.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub variable: String,
    pub value: f64,
}

#[derive(Deserialize)]
struct RawCommand {
    variable: String,
    value: serde_json::Value,
}

/// Parse one raw command.
///
/// Tolerates surrounding noise (prompts, newlines, HTTP detritus) by
/// extracting the outermost `{...}` region first. Extra JSON fields are
/// ignored; booleans coerce to 0/1.
pub fn parse_command(raw: &str) -> Option<ParsedCommand> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    let cmd: RawCommand = match serde_json::from_str(&raw[start..=end]) {
        Ok(cmd) => cmd,
        Err(e) => {
            debug!(error = %e, "unparseable command");
            return None;
        }
    };

    let value = match &cmd.value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::Bool(b) => f64::from(u8::from(*b)),
        other => {
            debug!(variable = %cmd.variable, value = %other, "command value is not numeric");
            return None;
        }
    };

    Some(ParsedCommand {
        variable: cmd.variable,
        value,
    })
}

/// Drain both channels and translate, TCP before WebSocket.
///
/// Step commands are also applied to the snapshot immediately (clamped), so
/// local readers see the new value on this tick instead of waiting for the
/// simulator to echo it back.
pub fn drain_and_translate(
    tcp: &CommandQueue,
    ws: &CommandQueue,
    snapshot: &mut TelemetrySnapshot,
) -> Vec<SimMessage> {
    let mut out = Vec::new();
    for queue in [tcp, ws] {
        while let Some(raw) = queue.pop() {
            let Some(cmd) = parse_command(&raw) else {
                continue;
            };
            if let Some(msg) = translate(&cmd, snapshot) {
                out.push(msg);
            }
        }
    }
    out
}

fn translate(cmd: &ParsedCommand, snapshot: &mut TelemetrySnapshot) -> Option<SimMessage> {
    let reg = registry();
    let Some(index) = reg.index_of_name(&cmd.variable) else {
        debug!(variable = %cmd.variable, "command for unknown variable");
        return None;
    };
    let def = reg.def(index);
    if !def.access.is_writable() {
        debug!(variable = %cmd.variable, "command for read-only variable");
        return None;
    }

    let Some(value) = def.data_type.numeric_payload(cmd.value) else {
        debug!(variable = %cmd.variable, "variable does not accept numeric commands");
        return None;
    };

    if def.flag == PrimaryFlag::Step {
        snapshot.apply_step(index, cmd.value);
    }

    Some(SimMessage::new(
        reg.hash_of(index),
        def.flag.wire_flags(),
        value,
    ))
}
