//! Network fan-out: TCP telemetry/command listeners and the WebSocket
//! server. Both transports broadcast the identical JSON payload; the host
//! thread drives broadcasts, server threads only accept and read.

pub mod frame;
pub mod tcp;
pub mod ws;

pub use tcp::{CommandServer, TelemetryServer, DEFAULT_COMMAND_PORT, DEFAULT_TELEMETRY_PORT};
pub use ws::{WebSocketServer, DEFAULT_WS_PORT};
