//! Named non-scalar slots of the telemetry snapshot.
//!
//! Vector and string variables live as dedicated struct fields rather than
//! in the scalar array. These enums are how the registry table refers to
//! those fields without baking byte offsets into the table itself; offsets
//! are resolved from the concrete layout when the sidecar is exported.

use super::TelemetrySnapshot;
use std::mem::offset_of;

/// Capacity of `Aircraft.Name`.
pub const AIRCRAFT_NAME_CAP: usize = 32;
/// Capacity of `Aircraft.NearestAirportIdentifier`.
pub const AIRPORT_ID_CAP: usize = 8;
/// Capacity of `Aircraft.NearestAirportName`.
pub const AIRPORT_NAME_CAP: usize = 64;
/// Capacity of the autopilot mode annunciations.
pub const AP_MODE_CAP: usize = 16;

/// Two-component vector fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vec2Field {
    NearestAirportLocation,
}

/// Three-component vector fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vec3Field {
    Position,
    Velocity,
    Acceleration,
    AngularVelocity,
    Wind,
    Gravity,
}

/// Fixed-capacity string fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrField {
    AircraftName,
    NearestAirportId,
    NearestAirportName,
    AutopilotLateralMode,
    AutopilotVerticalMode,
}

impl Vec2Field {
    pub fn byte_offset(self) -> usize {
        match self {
            Vec2Field::NearestAirportLocation => {
                offset_of!(TelemetrySnapshot, nearest_airport_location)
            }
        }
    }

    pub const fn byte_len(self) -> usize {
        16
    }
}

impl Vec3Field {
    pub fn byte_offset(self) -> usize {
        match self {
            Vec3Field::Position => offset_of!(TelemetrySnapshot, position),
            Vec3Field::Velocity => offset_of!(TelemetrySnapshot, velocity),
            Vec3Field::Acceleration => offset_of!(TelemetrySnapshot, acceleration),
            Vec3Field::AngularVelocity => offset_of!(TelemetrySnapshot, angular_velocity),
            Vec3Field::Wind => offset_of!(TelemetrySnapshot, wind),
            Vec3Field::Gravity => offset_of!(TelemetrySnapshot, gravity),
        }
    }

    pub const fn byte_len(self) -> usize {
        24
    }
}

impl StrField {
    pub fn byte_offset(self) -> usize {
        match self {
            StrField::AircraftName => offset_of!(TelemetrySnapshot, aircraft_name),
            StrField::NearestAirportId => offset_of!(TelemetrySnapshot, nearest_airport_id),
            StrField::NearestAirportName => offset_of!(TelemetrySnapshot, nearest_airport_name),
            StrField::AutopilotLateralMode => {
                offset_of!(TelemetrySnapshot, autopilot_lateral_mode)
            }
            StrField::AutopilotVerticalMode => {
                offset_of!(TelemetrySnapshot, autopilot_vertical_mode)
            }
        }
    }

    /// Buffer capacity including the terminating NUL.
    pub const fn capacity(self) -> usize {
        match self {
            StrField::AircraftName => AIRCRAFT_NAME_CAP,
            StrField::NearestAirportId => AIRPORT_ID_CAP,
            StrField::NearestAirportName => AIRPORT_NAME_CAP,
            StrField::AutopilotLateralMode | StrField::AutopilotVerticalMode => AP_MODE_CAP,
        }
    }

    pub const fn byte_len(self) -> usize {
        self.capacity()
    }
}
