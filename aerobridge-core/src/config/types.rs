use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Bridge configuration, environment-driven and read once at init.
///
/// Every field maps to an `AEROFLY_BRIDGE_*` environment variable (see the
/// loader in the parent module). `ws_enable` is numeric (`0` / `1`) to match
/// the conventions of the host's launcher scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Enable the WebSocket fan-out (`AEROFLY_BRIDGE_WS_ENABLE`).
    #[serde(default = "default_ws_enable")]
    pub ws_enable: u8,

    /// WebSocket port (`AEROFLY_BRIDGE_WS_PORT`).
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,

    /// Broadcast interval in milliseconds, clamped to >= 5
    /// (`AEROFLY_BRIDGE_BROADCAST_MS`).
    #[serde(default = "default_broadcast_ms")]
    pub broadcast_ms: u64,

    /// TCP telemetry port (`AEROFLY_BRIDGE_TCP_PORT`).
    #[serde(default = "default_tcp_port")]
    pub tcp_port: u16,

    /// TCP command port (`AEROFLY_BRIDGE_COMMAND_PORT`).
    #[serde(default = "default_command_port")]
    pub command_port: u16,

    /// Directory receiving the offsets sidecar
    /// (`AEROFLY_BRIDGE_OUTPUT_DIR`; default: current directory).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory holding the shared region file; `None` means the platform
    /// default. Used by tests, not exposed through the environment.
    #[serde(default, skip_serializing)]
    pub region_dir: Option<PathBuf>,

    /// Log level filter (`AEROFLY_BRIDGE_LOG_LEVEL`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl BridgeConfig {
    #[inline]
    pub fn ws_enabled(&self) -> bool {
        self.ws_enable != 0
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ws_enable: default_ws_enable(),
            ws_port: default_ws_port(),
            broadcast_ms: default_broadcast_ms(),
            tcp_port: default_tcp_port(),
            command_port: default_command_port(),
            output_dir: default_output_dir(),
            region_dir: None,
            log_level: default_log_level(),
        }
    }
}

fn default_ws_enable() -> u8 {
    1
}

fn default_ws_port() -> u16 {
    crate::net::DEFAULT_WS_PORT
}

fn default_broadcast_ms() -> u64 {
    20
}

fn default_tcp_port() -> u16 {
    crate::net::DEFAULT_TELEMETRY_PORT
}

fn default_command_port() -> u16 {
    crate::net::DEFAULT_COMMAND_PORT
}

fn default_output_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_log_level() -> String {
    "info".to_string()
}
