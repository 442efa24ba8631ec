//! Vehicle and autopilot classification decoded from small protocol enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer identifier of one tracked system.
pub type SystemId = u32;

/// Airframe class reported in the heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Generic,
    FixedWing,
    Quadrotor,
    Coaxial,
    Helicopter,
    AntennaTracker,
    Gcs,
    Airship,
    FreeBalloon,
    Rocket,
    GroundRover,
    SurfaceBoat,
    Submarine,
    Hexarotor,
    Octorotor,
    Tricopter,
    FlappingWing,
    Kite,
    OnboardController,
    Unknown,
}

impl VehicleType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Generic,
            1 => Self::FixedWing,
            2 => Self::Quadrotor,
            3 => Self::Coaxial,
            4 => Self::Helicopter,
            5 => Self::AntennaTracker,
            6 => Self::Gcs,
            7 => Self::Airship,
            8 => Self::FreeBalloon,
            9 => Self::Rocket,
            10 => Self::GroundRover,
            11 => Self::SurfaceBoat,
            12 => Self::Submarine,
            13 => Self::Hexarotor,
            14 => Self::Octorotor,
            15 => Self::Tricopter,
            16 => Self::FlappingWing,
            17 => Self::Kite,
            18 => Self::OnboardController,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::FixedWing => "fixed wing",
            Self::Quadrotor => "quadrotor",
            Self::Coaxial => "coax",
            Self::Helicopter => "heli",
            Self::AntennaTracker => "antennatracker",
            Self::Gcs => "GCS",
            Self::Airship => "airship",
            Self::FreeBalloon => "balloon",
            Self::Rocket => "rocket",
            Self::GroundRover => "rover",
            Self::SurfaceBoat => "boat",
            Self::Submarine => "submarine",
            Self::Hexarotor => "hexarotor",
            Self::Octorotor => "octarotor",
            Self::Tricopter => "tricopter",
            Self::FlappingWing => "flapwing",
            Self::Kite => "kite",
            Self::OnboardController => "onboard controller",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flight stack reported in the heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutopilotType {
    Generic,
    Slugs,
    ArduPilotMega,
    OpenPilot,
    Px4,
    Unknown,
}

impl AutopilotType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Generic,
            2 => Self::Slugs,
            3 => Self::ArduPilotMega,
            4 => Self::OpenPilot,
            12 => Self::Px4,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Slugs => "Slugs",
            Self::ArduPilotMega => "ArduPilotMega",
            Self::OpenPilot => "OpenPilot",
            Self::Px4 => "PX4",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AutopilotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of a MAV_STATE value.
pub fn system_state_name(code: u8) -> &'static str {
    match code {
        0 => "uninitialized",
        1 => "boot",
        2 => "calibrating",
        3 => "standby",
        4 => "active",
        5 => "critical",
        6 => "emergency",
        7 => "poweroff",
        _ => "unknown",
    }
}

/// Base-mode flag bits.
pub mod mode_flags {
    pub const ARMED: u8 = 128;
    pub const MANUAL: u8 = 64;
    pub const STABILIZE: u8 = 16;
    pub const GUIDED: u8 = 8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_type_codes() {
        assert_eq!(VehicleType::from_code(1), VehicleType::FixedWing);
        assert_eq!(VehicleType::from_code(1).as_str(), "fixed wing");
        assert_eq!(VehicleType::from_code(18).as_str(), "onboard controller");
        assert_eq!(VehicleType::from_code(99), VehicleType::Unknown);
    }

    #[test]
    fn test_autopilot_codes() {
        assert_eq!(AutopilotType::from_code(3).to_string(), "ArduPilotMega");
        assert_eq!(AutopilotType::from_code(12), AutopilotType::Px4);
        assert_eq!(AutopilotType::from_code(1), AutopilotType::Unknown);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(system_state_name(4), "active");
        assert_eq!(system_state_name(200), "unknown");
    }
}
