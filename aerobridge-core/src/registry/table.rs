//! The authoritative variable table.
//!
//! Logical index = position in this table. Append-only: inserting a row in
//! the middle shifts every later index and therefore requires bumping the
//! snapshot layout version. Name uniqueness and the size cap are enforced at
//! build time in the parent module.

use super::{Access, PrimaryFlag, Storage, Unit, VariableDef};
use crate::codec::DataType;
use crate::snapshot::{StrField, Vec2Field, Vec3Field};

const fn value(name: &'static str, unit: Unit) -> VariableDef {
    VariableDef {
        name,
        data_type: DataType::Double,
        flag: PrimaryFlag::Value,
        access: Access::Read,
        unit,
        storage: Storage::Scalar,
    }
}

const fn value_rw(name: &'static str, unit: Unit) -> VariableDef {
    VariableDef {
        name,
        data_type: DataType::Double,
        flag: PrimaryFlag::Value,
        access: Access::ReadWrite,
        unit,
        storage: Storage::Scalar,
    }
}

const fn event(name: &'static str) -> VariableDef {
    VariableDef {
        name,
        data_type: DataType::Double,
        flag: PrimaryFlag::Event,
        access: Access::Write,
        unit: Unit::None,
        storage: Storage::MessageOnly,
    }
}

const fn toggle_rw(name: &'static str) -> VariableDef {
    VariableDef {
        name,
        data_type: DataType::Double,
        flag: PrimaryFlag::Toggle,
        access: Access::ReadWrite,
        unit: Unit::None,
        storage: Storage::Scalar,
    }
}

const fn active_rw(name: &'static str) -> VariableDef {
    VariableDef {
        name,
        data_type: DataType::Double,
        flag: PrimaryFlag::Active,
        access: Access::ReadWrite,
        unit: Unit::None,
        storage: Storage::Scalar,
    }
}

const fn step(name: &'static str) -> VariableDef {
    VariableDef {
        name,
        data_type: DataType::Double,
        flag: PrimaryFlag::Step,
        access: Access::ReadWrite,
        unit: Unit::None,
        storage: Storage::Scalar,
    }
}

const fn vec2(name: &'static str, unit: Unit, field: Vec2Field) -> VariableDef {
    VariableDef {
        name,
        data_type: DataType::Vector2d,
        flag: PrimaryFlag::Value,
        access: Access::Read,
        unit,
        storage: Storage::Vector2(field),
    }
}

const fn vec3(name: &'static str, unit: Unit, field: Vec3Field) -> VariableDef {
    VariableDef {
        name,
        data_type: DataType::Vector3d,
        flag: PrimaryFlag::Value,
        access: Access::Read,
        unit,
        storage: Storage::Vector3(field),
    }
}

const fn string(name: &'static str, field: StrField) -> VariableDef {
    VariableDef {
        name,
        data_type: DataType::String,
        flag: PrimaryFlag::Value,
        access: Access::Read,
        unit: Unit::None,
        storage: Storage::Str(field),
    }
}

/// Every variable the bridge exposes, in logical-index order.
pub const TABLE: &[VariableDef] = &[
    // Aircraft: position and attitude
    value("Aircraft.Latitude", Unit::Degree),
    value("Aircraft.Longitude", Unit::Degree),
    value("Aircraft.Altitude", Unit::Meter),
    value("Aircraft.Height", Unit::Meter),
    value("Aircraft.Pitch", Unit::Radian),
    value("Aircraft.Bank", Unit::Radian),
    value("Aircraft.TrueHeading", Unit::Radian),
    value("Aircraft.MagneticHeading", Unit::Radian),
    // Aircraft: speeds
    value("Aircraft.IndicatedAirspeed", Unit::MeterPerSecond),
    value("Aircraft.IndicatedAirspeedTrend", Unit::MeterPerSecond),
    value("Aircraft.GroundSpeed", Unit::MeterPerSecond),
    value("Aircraft.VerticalSpeed", Unit::MeterPerSecond),
    value("Aircraft.MachNumber", Unit::None),
    value("Aircraft.AngleOfAttack", Unit::Radian),
    value("Aircraft.AngleOfAttackLimit", Unit::Radian),
    value("Aircraft.RateOfTurn", Unit::RadianPerSecond),
    value("Aircraft.RadarAltitude", Unit::Meter),
    // Aircraft: state
    value("Aircraft.OnGround", Unit::None),
    value("Aircraft.OnRunway", Unit::None),
    value("Aircraft.Crashed", Unit::None),
    value("Aircraft.Gear", Unit::None),
    value("Aircraft.Flaps", Unit::None),
    value("Aircraft.Slats", Unit::None),
    value("Aircraft.Throttle", Unit::None),
    value("Aircraft.AirBrake", Unit::None),
    value_rw("Aircraft.ParkingBrake", Unit::None),
    // Aircraft: physics vectors
    vec3("Aircraft.Position", Unit::Meter, Vec3Field::Position),
    vec3("Aircraft.Velocity", Unit::MeterPerSecond, Vec3Field::Velocity),
    vec3(
        "Aircraft.Acceleration",
        Unit::MeterPerSecond2,
        Vec3Field::Acceleration,
    ),
    vec3(
        "Aircraft.AngularVelocity",
        Unit::RadianPerSecond,
        Vec3Field::AngularVelocity,
    ),
    vec3("Aircraft.Wind", Unit::MeterPerSecond, Vec3Field::Wind),
    vec3("Aircraft.Gravity", Unit::MeterPerSecond2, Vec3Field::Gravity),
    // Aircraft: nearest airport
    value("Aircraft.NearestAirportElevation", Unit::Meter),
    vec2(
        "Aircraft.NearestAirportLocation",
        Unit::Degree,
        Vec2Field::NearestAirportLocation,
    ),
    string("Aircraft.Name", StrField::AircraftName),
    string(
        "Aircraft.NearestAirportIdentifier",
        StrField::NearestAirportId,
    ),
    string("Aircraft.NearestAirportName", StrField::NearestAirportName),
    // Aircraft: engines
    active_rw("Aircraft.EngineMaster1"),
    active_rw("Aircraft.EngineMaster2"),
    value_rw("Aircraft.EngineThrottle1", Unit::None),
    value_rw("Aircraft.EngineThrottle2", Unit::None),
    value("Aircraft.EngineRotationSpeed1", Unit::RadianPerSecond),
    value("Aircraft.EngineRotationSpeed2", Unit::RadianPerSecond),
    value("Aircraft.EngineRunning1", Unit::None),
    value("Aircraft.EngineRunning2", Unit::None),
    active_rw("Aircraft.Starter1"),
    active_rw("Aircraft.Starter2"),
    // Performance speeds
    value("Performance.Speed.VS0", Unit::MeterPerSecond),
    value("Performance.Speed.VS1", Unit::MeterPerSecond),
    value("Performance.Speed.VFE", Unit::MeterPerSecond),
    value("Performance.Speed.VNO", Unit::MeterPerSecond),
    value("Performance.Speed.VNE", Unit::MeterPerSecond),
    value("Performance.Speed.VAPP", Unit::MeterPerSecond),
    value("Performance.Speed.Minimum", Unit::MeterPerSecond),
    value("Performance.Speed.Maximum", Unit::MeterPerSecond),
    // Controls
    value_rw("Controls.Throttle", Unit::None),
    value_rw("Controls.Throttle1", Unit::None),
    value_rw("Controls.Throttle2", Unit::None),
    value_rw("Controls.Throttle3", Unit::None),
    value_rw("Controls.Throttle4", Unit::None),
    value_rw("Controls.Pitch.Input", Unit::None),
    value_rw("Controls.Roll.Input", Unit::None),
    value_rw("Controls.Yaw.Input", Unit::None),
    value_rw("Controls.Flaps", Unit::None),
    value_rw("Controls.Gear", Unit::None),
    value_rw("Controls.WheelBrake.Left", Unit::None),
    value_rw("Controls.WheelBrake.Right", Unit::None),
    value_rw("Controls.AirBrake", Unit::None),
    value_rw("Controls.GliderAirBrake", Unit::None),
    value_rw("Controls.Collective", Unit::None),
    value_rw("Controls.Trim", Unit::None),
    // Navigation
    value_rw("Navigation.SelectedCourse1", Unit::Radian),
    value_rw("Navigation.SelectedCourse2", Unit::Radian),
    value_rw("Navigation.NAV1Frequency", Unit::Hertz),
    value_rw("Navigation.NAV1StandbyFrequency", Unit::Hertz),
    event("Navigation.NAV1FrequencySwap"),
    value_rw("Navigation.NAV2Frequency", Unit::Hertz),
    value_rw("Navigation.NAV2StandbyFrequency", Unit::Hertz),
    event("Navigation.NAV2FrequencySwap"),
    value_rw("Navigation.ADF1Frequency", Unit::Hertz),
    value("Navigation.DME1Distance", Unit::Meter),
    value("Navigation.DME1Time", Unit::Second),
    value("Navigation.ILS1Course", Unit::Radian),
    // Communication
    value_rw("Communication.COM1Frequency", Unit::Hertz),
    value_rw("Communication.COM1StandbyFrequency", Unit::Hertz),
    event("Communication.COM1FrequencySwap"),
    value_rw("Communication.COM2Frequency", Unit::Hertz),
    value_rw("Communication.COM2StandbyFrequency", Unit::Hertz),
    event("Communication.COM2FrequencySwap"),
    value_rw("Communication.TransponderCode", Unit::None),
    value_rw("Communication.TransponderCursor", Unit::None),
    // Autopilot
    toggle_rw("Autopilot.Master"),
    event("Autopilot.Disengage"),
    value_rw("Autopilot.Heading", Unit::Radian),
    value_rw("Autopilot.VerticalSpeed", Unit::MeterPerSecond),
    value_rw("Autopilot.SelectedSpeed", Unit::MeterPerSecond),
    value_rw("Autopilot.SelectedHeading", Unit::Radian),
    value_rw("Autopilot.SelectedAltitude", Unit::Meter),
    value_rw("Autopilot.SelectedVerticalSpeed", Unit::MeterPerSecond),
    value("Autopilot.Engaged", Unit::None),
    value_rw("Autopilot.UseMachNumber", Unit::None),
    value("Autopilot.SpeedManaged", Unit::None),
    value("Autopilot.ThrottleEngaged", Unit::None),
    string("Autopilot.ActiveLateralMode", StrField::AutopilotLateralMode),
    string(
        "Autopilot.ActiveVerticalMode",
        StrField::AutopilotVerticalMode,
    ),
    // Warnings
    value("Warnings.MasterWarning", Unit::None),
    value("Warnings.MasterCaution", Unit::None),
    value("Warnings.EngineFire", Unit::None),
    value("Warnings.LowOilPressure", Unit::None),
    value("Warnings.LowFuelPressure", Unit::None),
    value("Warnings.AltitudeAlert", Unit::None),
    event("Warnings.WarningMute"),
    // Doors and windows (step controls)
    step("Doors.Left"),
    step("Doors.Right"),
    step("Windows.Left"),
    step("Windows.Right"),
    // Simulation
    toggle_rw("Simulation.Pause"),
    toggle_rw("Simulation.Sound"),
    event("Simulation.TimeChange"),
    value_rw("Simulation.Visibility", Unit::None),
    value("Simulation.Time", Unit::Second),
    event("Simulation.PlaybackStart"),
    event("Simulation.PlaybackStop"),
    event("Simulation.LiftUp"),
    // View
    toggle_rw("View.Internal"),
    event("View.Follow"),
    event("View.Category"),
    event("View.Mode"),
    value_rw("View.Zoom", Unit::None),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::VAR_COUNT;

    #[test]
    fn test_table_is_reasonably_populated() {
        assert!(VAR_COUNT >= 100, "table shrank to {VAR_COUNT}");
    }

    #[test]
    fn test_step_controls_are_writable_scalars() {
        for def in TABLE {
            if def.flag == PrimaryFlag::Step {
                assert!(def.access.is_writable(), "{}", def.name);
                assert_eq!(def.storage, Storage::Scalar, "{}", def.name);
            }
        }
    }

    #[test]
    fn test_events_have_no_snapshot_slot() {
        for def in TABLE {
            if def.flag == PrimaryFlag::Event {
                assert_eq!(def.storage, Storage::MessageOnly, "{}", def.name);
            }
        }
    }
}
