//! Monotonic microsecond clock and the broadcast throttle.
//!
//! Timestamps are microseconds since process start (matching the snapshot
//! header contract), never wall-clock time.

use std::sync::OnceLock;
use std::time::Instant;

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Microseconds since process start, monotonic.
#[inline]
pub fn now_us() -> u64 {
    PROCESS_START.get_or_init(Instant::now).elapsed().as_micros() as u64
}

/// Rate limiter for telemetry broadcasts.
///
/// One throttle drives both fan-out transports so every broadcast tick
/// produces exactly one payload. Interval checks take an explicit
/// now-microseconds argument so the cadence is testable without sleeping.
#[derive(Debug)]
pub struct BroadcastThrottle {
    interval_us: u64,
    last_broadcast_us: Option<u64>,
    measured_hz: f64,
}

impl BroadcastThrottle {
    /// Minimum broadcast interval in milliseconds.
    pub const MIN_INTERVAL_MS: u64 = 5;

    pub fn new(interval_ms: u64) -> Self {
        let interval_ms = interval_ms.max(Self::MIN_INTERVAL_MS);
        Self {
            interval_us: interval_ms * 1_000,
            last_broadcast_us: None,
            measured_hz: 0.0,
        }
    }

    /// Returns true and arms the next interval if enough time has elapsed.
    /// The very first call always broadcasts.
    pub fn should_broadcast(&mut self, now_us: u64) -> bool {
        if let Some(last) = self.last_broadcast_us {
            let delta_us = now_us.saturating_sub(last);
            if delta_us < self.interval_us {
                return false;
            }
            if delta_us > 0 {
                self.measured_hz = 1_000_000.0 / delta_us as f64;
            }
        }
        self.last_broadcast_us = Some(now_us);
        true
    }

    /// Measured broadcast rate over the last interval, in Hz.
    #[inline]
    pub fn measured_hz(&self) -> f64 {
        self.measured_hz
    }

    #[inline]
    pub fn interval_ms(&self) -> u64 {
        self.interval_us / 1_000
    }
}
