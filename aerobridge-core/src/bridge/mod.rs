//! The bridge orchestrator: owns every subsystem and sequences the
//! init / tick / shutdown lifecycle the host drives.
//!
//! Per tick, in order: decode the host stream into the snapshot, broadcast
//! one JSON payload to both transports if the throttle elapsed and anyone is
//! listening, then drain and translate queued commands for the host. All of
//! it runs on the host thread; nothing here blocks.

use crate::codec::SimMessage;
use crate::command::{self, CommandQueue};
use crate::config::BridgeConfig;
use crate::net::{CommandServer, TelemetryServer, WebSocketServer};
use crate::shm::{self, SharedMemoryPublisher};
use crate::telemetry::{decode_and_apply, JsonBuilder};
use crate::utils::{now_us, BroadcastThrottle};
use anyhow::{Context, Result};
use tracing::{info, warn};

pub struct Bridge {
    config: BridgeConfig,
    shm: Option<SharedMemoryPublisher>,
    json: JsonBuilder,
    throttle: BroadcastThrottle,
    telemetry_server: Option<TelemetryServer>,
    command_server: Option<CommandServer>,
    ws_server: Option<WebSocketServer>,
    tcp_commands: CommandQueue,
    ws_commands: CommandQueue,
}

impl Bridge {
    /// Bring the bridge up.
    ///
    /// Shared memory is mandatory; either network listener failing to bind
    /// degrades that channel with a warning and the bridge carries on.
    pub fn init(config: BridgeConfig) -> Result<Self> {
        info!(?config, "bridge initializing");

        let shm = match &config.region_dir {
            Some(dir) => SharedMemoryPublisher::create_in(dir),
            None => SharedMemoryPublisher::create(),
        }
        .context("shared memory init failed")?;

        if let Err(e) = shm::write_sidecar(&config.output_dir) {
            warn!(error = %e, "offsets sidecar not written; shared-memory consumers must derive offsets themselves");
        }

        let tcp_commands = command::command_queue();
        let ws_commands = command::command_queue();

        let telemetry_server = match TelemetryServer::start(config.tcp_port) {
            Ok(server) => Some(server),
            Err(e) => {
                warn!(error = %e, "telemetry channel disabled");
                None
            }
        };
        let command_server = match CommandServer::start(config.command_port, tcp_commands.clone())
        {
            Ok(server) => Some(server),
            Err(e) => {
                warn!(error = %e, "command channel disabled");
                None
            }
        };
        let ws_server = if config.ws_enabled() {
            match WebSocketServer::start(config.ws_port, ws_commands.clone()) {
                Ok(server) => Some(server),
                Err(e) => {
                    warn!(error = %e, "websocket channel disabled");
                    None
                }
            }
        } else {
            info!("websocket channel disabled by configuration");
            None
        };

        let throttle = BroadcastThrottle::new(config.broadcast_ms);

        info!("bridge initialized");
        Ok(Self {
            config,
            shm: Some(shm),
            json: JsonBuilder::new(),
            throttle,
            telemetry_server,
            command_server,
            ws_server,
            tcp_commands,
            ws_commands,
        })
    }

    /// One host tick: decode, maybe broadcast, translate commands.
    pub fn tick(&mut self, received: &[u8], _dt: f64) -> Vec<SimMessage> {
        let Some(shm) = self.shm.as_mut() else {
            return Vec::new();
        };
        let now = now_us();

        decode_and_apply(shm.snapshot_mut(), received, now);

        let listeners = self
            .telemetry_server
            .as_ref()
            .map_or(0, TelemetryServer::client_count)
            + self
                .ws_server
                .as_ref()
                .map_or(0, WebSocketServer::client_count);

        if listeners > 0 && self.throttle.should_broadcast(now) {
            let rate_hz = self.throttle.measured_hz();
            let payload = self.json.build(shm.snapshot(), rate_hz);
            if let Some(server) = &self.telemetry_server {
                server.broadcast(payload);
            }
            if let Some(server) = &self.ws_server {
                server.broadcast(payload);
            }
        }

        command::drain_and_translate(&self.tcp_commands, &self.ws_commands, shm.snapshot_mut())
    }

    /// Tear everything down: WebSocket first, then TCP, then the region.
    /// Safe to call multiple times.
    pub fn shutdown(&mut self) {
        if let Some(mut server) = self.ws_server.take() {
            server.stop();
        }
        if let Some(mut server) = self.command_server.take() {
            server.stop();
        }
        if let Some(mut server) = self.telemetry_server.take() {
            server.stop();
        }
        if let Some(shm) = self.shm.take() {
            shm.close();
        }
        info!("bridge shut down");
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Ports actually bound (useful with port-0 test configs):
    /// (telemetry, command, websocket).
    pub fn bound_ports(&self) -> (Option<u16>, Option<u16>, Option<u16>) {
        (
            self.telemetry_server.as_ref().map(TelemetryServer::local_port),
            self.command_server.as_ref().map(CommandServer::local_port),
            self.ws_server.as_ref().map(WebSocketServer::local_port),
        )
    }

    /// The snapshot view, for in-process readers and tests.
    pub fn snapshot(&self) -> Option<&crate::snapshot::TelemetrySnapshot> {
        self.shm.as_ref().map(SharedMemoryPublisher::snapshot)
    }

    /// Path of the shared region file.
    pub fn region_path(&self) -> Option<&std::path::Path> {
        self.shm.as_ref().map(SharedMemoryPublisher::path)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}
