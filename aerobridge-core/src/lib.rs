//! Aerobridge Core - Aerofly FS telemetry bridge
//!
//! An in-process bridge between a flight simulator host and external
//! consumers. The host loads the bridge as a module and calls one tick
//! entry point at 50-60 Hz with the simulator's message stream; the bridge
//! fans telemetry out and feeds commands back, all within the tick budget.
//!
//! ## System Architecture
//!
//! ```text
//! Simulator host (50-60 Hz tick)
//!         |
//!         v  message byte stream
//! +------------------+     +---------------------------+
//! |  Decoder         | --> |  TelemetrySnapshot        |
//! |  (hash dispatch) |     |  (shared memory, seqlock) |
//! +------------------+     +---------------------------+
//!                             |            |
//!                 validity-gated read      |  mmap
//!                             v            v
//!                    +--------------+   external readers
//!                    | JSON builder |   (offsets sidecar)
//!                    +--------------+
//!                       |        |
//!              same bytes        same bytes
//!                       v        v
//!               TCP :12345    WebSocket :8765
//!                       ^        ^
//!                       |        |  JSON commands
//!               TCP :12346    text frames
//!                       \        /
//!                        v      v
//!                  +------------------+
//!                  | Command ingress  | --> messages back to host
//!                  +------------------+
//! ```
//!
//! ## Core Modules
//!
//! - [`registry`] - the authoritative variable table and O(1) lookups
//! - [`snapshot`] - the fixed-layout record and its validity gate
//! - [`codec`] - simulator message framing and the name-hash convention
//! - [`telemetry`] - per-tick decoding and the broadcast JSON document
//! - [`net`] - TCP and WebSocket fan-out, RFC 6455 frame codec
//! - [`shm`] - shared-memory publisher and the offsets sidecar
//! - [`command`] - JSON command parsing and translation
//! - [`bridge`] - the orchestrator wiring it all together
//!
//! ## Concurrency Model
//!
//! The host thread runs decode, broadcast, and command translation
//! synchronously inside the tick; it never blocks. Server threads only
//! accept and read on non-blocking sockets, polled with bounded sleeps so
//! shutdown is prompt. The snapshot is single-writer; concurrent readers
//! use the validity gate instead of locks.

pub mod bridge;
pub mod codec;
pub mod command;
pub mod config;
pub mod net;
pub mod registry;
pub mod shm;
pub mod snapshot;
pub mod telemetry;
pub mod utils;

// Test support (not part of the bridge data plane)
pub mod testing;

// Re-export the orchestration surface
pub use bridge::Bridge;
pub use config::BridgeConfig;

// Re-export error types
pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bridge::Bridge;
    pub use crate::codec::{DataType, MessageValue, SimMessage};
    pub use crate::command::{CommandQueue, ParsedCommand};
    pub use crate::config::BridgeConfig;
    pub use crate::registry::{registry, Descriptor};
    pub use crate::snapshot::TelemetrySnapshot;
    pub use crate::{Error, Result};
}
