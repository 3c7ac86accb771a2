//! The telemetry snapshot: one fixed-layout record holding the latest value
//! of every registered variable.
//!
//! The snapshot is the single shared ABI between the decoder (writer), the
//! JSON builder, and external shared-memory consumers. Layout is `repr(C)`,
//! little-endian doubles, and changes only with [`LAYOUT_VERSION`].
//!
//! Writer discipline: exactly one writer (the host thread). Readers in other
//! processes detect torn reads through the validity gate: `data_valid` drops
//! to 0 for the duration of an update and `update_counter` increments on
//! commit, so a reader sampling the gate before and after either sees a
//! consistent record or retries.

pub mod fields;

#[cfg(test)]
mod sanitize_proptest;

pub use fields::{StrField, Vec2Field, Vec3Field};

use crate::codec::{Vector2, Vector3};
use crate::registry::VAR_COUNT;
use std::mem::offset_of;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Bumped whenever the snapshot layout changes incompatibly.
pub const LAYOUT_VERSION: u32 = 1;

/// Total size of the shared record in bytes.
pub fn snapshot_size() -> usize {
    std::mem::size_of::<TelemetrySnapshot>()
}

/// Byte offset of the scalar array inside the record.
pub fn scalar_array_offset() -> usize {
    offset_of!(TelemetrySnapshot, values)
}

/// Stride of the scalar array.
pub const SCALAR_STRIDE: usize = 8;

/// Snapshot header. Atomics carry the validity gate across process
/// boundaries; everything else is plain data written by the single writer.
#[repr(C)]
pub struct SnapshotHeader {
    /// Microseconds since bridge process start, monotonic.
    pub timestamp_us: AtomicU64,
    /// 0 while the writer is mid-update, 1 when the record is consistent.
    pub data_valid: AtomicU32,
    /// Increments once per committed update.
    pub update_counter: AtomicU32,
    /// Layout identifier, fixed at init.
    pub layout_version: u32,
    _reserved: u32,
}

/// The shared telemetry record.
///
/// Region order: header, scalar array (one `f64` per logical index), vector
/// fields, string fields. String buffers are NUL-terminated; the final byte
/// is always 0.
#[repr(C)]
pub struct TelemetrySnapshot {
    pub header: SnapshotHeader,
    /// Last-written value per variable, indexed by logical index. Slots of
    /// non-scalar variables stay 0.
    pub values: [f64; VAR_COUNT],
    pub position: Vector3,
    pub velocity: Vector3,
    pub acceleration: Vector3,
    pub angular_velocity: Vector3,
    pub wind: Vector3,
    pub gravity: Vector3,
    pub nearest_airport_location: Vector2,
    pub aircraft_name: [u8; fields::AIRCRAFT_NAME_CAP],
    pub nearest_airport_id: [u8; fields::AIRPORT_ID_CAP],
    pub nearest_airport_name: [u8; fields::AIRPORT_NAME_CAP],
    pub autopilot_lateral_mode: [u8; fields::AP_MODE_CAP],
    pub autopilot_vertical_mode: [u8; fields::AP_MODE_CAP],
}

/// Coerce NaN / infinities to 0.0 so downstream JSON and UIs never see a
/// non-finite value.
#[inline]
pub fn safe_f64(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

impl TelemetrySnapshot {
    /// A fresh all-zero record with the current layout version.
    pub fn new() -> Box<Self> {
        // The record is large (> 1 KiB of scalars); build it in place from
        // zeroed heap memory rather than on the stack. All-zero bytes are a
        // valid value for every field.
        let mut snapshot = unsafe {
            let layout = std::alloc::Layout::new::<Self>();
            let ptr = std::alloc::alloc_zeroed(layout) as *mut Self;
            assert!(!ptr.is_null(), "snapshot allocation failed");
            Box::from_raw(ptr)
        };
        snapshot.header.layout_version = LAYOUT_VERSION;
        snapshot
    }

    /// Stamp the layout version on a zero-initialized mapping.
    pub fn init_in_place(&mut self) {
        self.header.layout_version = LAYOUT_VERSION;
        self.header.data_valid.store(0, Ordering::Release);
    }

    /// Open the validity gate; the record is inconsistent until
    /// [`Self::commit_update`].
    #[inline]
    pub fn begin_update(&mut self) {
        self.header.data_valid.store(0, Ordering::SeqCst);
    }

    /// Close the validity gate: stamp the time, bump the counter, mark valid.
    #[inline]
    pub fn commit_update(&mut self, now_us: u64) {
        self.header.timestamp_us.store(now_us, Ordering::Relaxed);
        self.header.update_counter.fetch_add(1, Ordering::Relaxed);
        self.header.data_valid.store(1, Ordering::Release);
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.header.data_valid.load(Ordering::Acquire) == 1
    }

    #[inline]
    pub fn update_counter(&self) -> u32 {
        self.header.update_counter.load(Ordering::Acquire)
    }

    #[inline]
    pub fn timestamp_us(&self) -> u64 {
        self.header.timestamp_us.load(Ordering::Acquire)
    }

    /// Store a scalar, coercing non-finite input to 0.0.
    #[inline]
    pub fn set_scalar(&mut self, index: usize, value: f64) {
        self.values[index] = safe_f64(value);
    }

    #[inline]
    pub fn scalar(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// Apply a step-control delta, clamping the stored value to [0, 1].
    #[inline]
    pub fn apply_step(&mut self, index: usize, delta: f64) {
        let next = self.values[index] + safe_f64(delta);
        self.values[index] = next.clamp(0.0, 1.0);
    }

    pub fn set_vector2(&mut self, field: Vec2Field, v: Vector2) {
        let slot = match field {
            Vec2Field::NearestAirportLocation => &mut self.nearest_airport_location,
        };
        *slot = Vector2::new(safe_f64(v.x), safe_f64(v.y));
    }

    pub fn set_vector3(&mut self, field: Vec3Field, v: Vector3) {
        let slot = match field {
            Vec3Field::Position => &mut self.position,
            Vec3Field::Velocity => &mut self.velocity,
            Vec3Field::Acceleration => &mut self.acceleration,
            Vec3Field::AngularVelocity => &mut self.angular_velocity,
            Vec3Field::Wind => &mut self.wind,
            Vec3Field::Gravity => &mut self.gravity,
        };
        *slot = Vector3::new(safe_f64(v.x), safe_f64(v.y), safe_f64(v.z));
    }

    pub fn vector2(&self, field: Vec2Field) -> Vector2 {
        match field {
            Vec2Field::NearestAirportLocation => self.nearest_airport_location,
        }
    }

    pub fn vector3(&self, field: Vec3Field) -> Vector3 {
        match field {
            Vec3Field::Position => self.position,
            Vec3Field::Velocity => self.velocity,
            Vec3Field::Acceleration => self.acceleration,
            Vec3Field::AngularVelocity => self.angular_velocity,
            Vec3Field::Wind => self.wind,
            Vec3Field::Gravity => self.gravity,
        }
    }

    /// Store a string: input is cut at the first NUL, non-printable bytes
    /// become spaces, the result is truncated to capacity - 1 and the buffer
    /// is always NUL-terminated.
    pub fn set_string(&mut self, field: StrField, bytes: &[u8]) {
        let buf: &mut [u8] = match field {
            StrField::AircraftName => &mut self.aircraft_name,
            StrField::NearestAirportId => &mut self.nearest_airport_id,
            StrField::NearestAirportName => &mut self.nearest_airport_name,
            StrField::AutopilotLateralMode => &mut self.autopilot_lateral_mode,
            StrField::AutopilotVerticalMode => &mut self.autopilot_vertical_mode,
        };
        let input = match bytes.iter().position(|&b| b == 0) {
            Some(n) => &bytes[..n],
            None => bytes,
        };
        let n = input.len().min(buf.len() - 1);
        for (dst, &src) in buf[..n].iter_mut().zip(input) {
            *dst = if (0x20..=0x7e).contains(&src) { src } else { b' ' };
        }
        for dst in &mut buf[n..] {
            *dst = 0;
        }
    }

    /// Read a string field up to its NUL terminator.
    pub fn string(&self, field: StrField) -> &str {
        let buf: &[u8] = match field {
            StrField::AircraftName => &self.aircraft_name,
            StrField::NearestAirportId => &self.nearest_airport_id,
            StrField::NearestAirportName => &self.nearest_airport_name,
            StrField::AutopilotLateralMode => &self.autopilot_lateral_mode,
            StrField::AutopilotVerticalMode => &self.autopilot_vertical_mode,
        };
        let n = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        // Sanitization guarantees printable ASCII.
        std::str::from_utf8(&buf[..n]).unwrap_or("")
    }

    /// Read through the validity gate: sample the gate before and after,
    /// retry on a torn read. Bounded so a never-valid record (e.g. before
    /// the first tick) cannot spin forever.
    pub fn read_validated<T>(&self, mut read: impl FnMut(&Self) -> T) -> T {
        const MAX_RETRIES: usize = 1_000;
        let mut last = None;
        for _ in 0..MAX_RETRIES {
            let counter_before = self.header.update_counter.load(Ordering::Acquire);
            let valid_before = self.header.data_valid.load(Ordering::Acquire);
            let out = read(self);
            let valid_after = self.header.data_valid.load(Ordering::Acquire);
            let counter_after = self.header.update_counter.load(Ordering::Acquire);
            if valid_before == 1 && valid_after == 1 && counter_before == counter_after {
                return out;
            }
            last = Some(out);
            std::hint::spin_loop();
        }
        last.expect("retry loop ran at least once")
    }
}
