//! Test helper utilities shared by unit and integration tests.
//!
//! Builders for encoded host streams, a port-0 bridge configuration, and
//! small socket helpers so network tests stay readable.

use crate::codec::{encode_stream, message_hash, MessageValue, SimMessage};
use crate::config::BridgeConfig;
use std::io::Read;
use std::net::TcpStream;
use std::path::Path;
use std::time::{Duration, Instant};

/// Encode one double-valued message stream for `name`.
pub fn double_stream(name: &str, value: f64) -> Vec<u8> {
    encode_stream(&[SimMessage::new(
        message_hash(name),
        0,
        MessageValue::Double(value),
    )])
}

/// Encode a stream of (name, value) doubles in order.
pub fn doubles_stream(pairs: &[(&str, f64)]) -> Vec<u8> {
    let messages: Vec<_> = pairs
        .iter()
        .map(|(name, value)| {
            SimMessage::new(message_hash(name), 0, MessageValue::Double(*value))
        })
        .collect();
    encode_stream(&messages)
}

/// A bridge configuration that binds ephemeral ports and keeps all files
/// inside `dir`. WebSocket on, since tests exercise it.
pub fn test_config(dir: &Path) -> BridgeConfig {
    BridgeConfig {
        ws_enable: 1,
        ws_port: 0,
        tcp_port: 0,
        command_port: 0,
        output_dir: dir.to_path_buf(),
        region_dir: Some(dir.to_path_buf()),
        ..BridgeConfig::default()
    }
}

/// Read from a socket until `\n` or the deadline. Panics on timeout so test
/// failures point at the read, not at a later assertion.
pub fn read_line_with_timeout(stream: &mut TcpStream, timeout: Duration) -> String {
    stream
        .set_read_timeout(Some(Duration::from_millis(50)))
        .unwrap();
    let deadline = Instant::now() + timeout;
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    while Instant::now() < deadline {
        match stream.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    return String::from_utf8_lossy(&line).into_owned();
                }
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => panic!("read failed: {e}"),
        }
    }
    panic!(
        "no newline within {timeout:?}; got {:?}",
        String::from_utf8_lossy(&line)
    );
}

/// Read exactly `n` bytes or panic at the deadline.
pub fn read_exact_with_timeout(stream: &mut TcpStream, n: usize, timeout: Duration) -> Vec<u8> {
    stream
        .set_read_timeout(Some(Duration::from_millis(50)))
        .unwrap();
    let deadline = Instant::now() + timeout;
    let mut out = vec![0u8; n];
    let mut filled = 0;
    while filled < n {
        if Instant::now() >= deadline {
            panic!("only {filled}/{n} bytes before deadline");
        }
        match stream.read(&mut out[filled..]) {
            Ok(0) => panic!("peer closed after {filled}/{n} bytes"),
            Ok(read) => filled += read,
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => panic!("read failed: {e}"),
        }
    }
    out
}

/// Poll `predicate` until it holds or the deadline passes.
pub fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}
