//! ---
//! vcb_section: "02-wire-vocabulary"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "Cluster state model and payload codecs."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::Display;

/// Drivetrain variant reported by the vehicle.
///
/// On the wire the variant travels as an integer code: `0` for combustion,
/// `1` for electric. Any other code is rejected by [`VehicleType::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VehicleType {
    /// Internal combustion drivetrain.
    Combustion,
    /// Battery electric drivetrain.
    Electric,
}

impl VehicleType {
    /// Map a wire code to a drivetrain variant.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(VehicleType::Combustion),
            1 => Some(VehicleType::Electric),
            _ => None,
        }
    }

    /// The integer code carried on the wire.
    pub fn code(&self) -> i64 {
        match self {
            VehicleType::Combustion => 0,
            VehicleType::Electric => 1,
        }
    }
}

/// Content shown on the central display area of the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CentralScreen {
    /// Driving-mode selector.
    Modes,
    /// Navigation map.
    Map,
    /// Forward/rear parking sensor view.
    SensorsForward,
    /// Blind-spot sensor view.
    SensorsBlind,
}

impl CentralScreen {
    /// Map a wire ordinal to a screen selection.
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(CentralScreen::Modes),
            1 => Some(CentralScreen::Map),
            2 => Some(CentralScreen::SensorsForward),
            3 => Some(CentralScreen::SensorsBlind),
            _ => None,
        }
    }

    /// The ordinal carried on the wire.
    pub fn ordinal(&self) -> i64 {
        match self {
            CentralScreen::Modes => 0,
            CentralScreen::Map => 1,
            CentralScreen::SensorsForward => 2,
            CentralScreen::SensorsBlind => 3,
        }
    }
}

/// Immutable snapshot of every vehicle-visible quantity on the cluster.
///
/// The snapshot is replaced wholesale, never mutated in place; every field
/// has a defined default so the type is never partially constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterState {
    /// Drivetrain variant.
    pub vehicle_type: VehicleType,
    /// Current transmission gear (P, R, N, D).
    pub gear: char,
    /// Unit label for the speed readout.
    pub speed_unit: String,
    /// Current vehicle speed.
    pub speed: i32,
    /// Whether cruise control is engaged.
    pub cruise_control: bool,
    /// Cruise-control set speed.
    pub cruise_control_speed: i32,
    /// Engine revolutions, in thousands.
    pub rpm: f32,
    /// Battery charge percentage.
    pub battery: i32,
    /// Remaining range.
    pub range_remaining: i32,
    /// Temperature unit selector (0 = Celsius, 1 = Fahrenheit).
    pub temp_unit: i32,
    /// Engine temperature.
    pub engine_temp: f32,
    /// Fuel economy display string.
    pub economy: String,
    /// Ambient temperature in Celsius.
    pub ambient_temp_c: i32,
    /// Whether location sharing is active.
    pub share_location: bool,
    /// Selected central display content.
    pub central_screen: CentralScreen,
    /// Top driving-mode label.
    pub mode_top: String,
    /// Middle driving-mode label (the current mode).
    pub mode_mid: String,
    /// Bottom driving-mode label.
    pub mode_bottom: String,
}

impl Default for ClusterState {
    fn default() -> Self {
        Self {
            vehicle_type: VehicleType::Combustion,
            gear: 'D',
            speed_unit: "mph".to_owned(),
            speed: 0,
            cruise_control: false,
            cruise_control_speed: 0,
            rpm: 0.0,
            battery: 0,
            range_remaining: 0,
            temp_unit: 0,
            engine_temp: 0.0,
            economy: "11.6 km/L".to_owned(),
            ambient_temp_c: 25,
            share_location: false,
            central_screen: CentralScreen::Modes,
            mode_top: "Race".to_owned(),
            mode_mid: "Sport+".to_owned(),
            mode_bottom: "City".to_owned(),
        }
    }
}
