//! ---
//! vcb_section: "01-state-binding"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "State binding runtime and lifecycle management."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
use vcb_msg::CentralScreen;

/// Step applied to the cruise-control set speed per speed action.
pub const SPEED_STEP: i32 = 10;
/// Upper clamp for the cruise-control set speed.
pub const MAX_SET_SPEED: i32 = 220;
/// Lower clamp for the cruise-control set speed.
pub const MIN_SET_SPEED: i32 = 0;

/// Direction of a cruise set-speed adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedAction {
    /// Raise the set speed by [`SPEED_STEP`], clamped to [`MAX_SET_SPEED`].
    Increase,
    /// Lower the set speed by [`SPEED_STEP`], clamped to [`MIN_SET_SPEED`].
    Decrease,
}

/// Parking-sensor button pressed by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkingSensor {
    /// Front sensor view.
    Front,
    /// Rear sensor view.
    Rear,
    /// Left blind-spot view.
    Left,
    /// Right-side control returning to the mode selector.
    Right,
}

impl ParkingSensor {
    /// Central screen shown while this sensor view is active.
    pub fn screen(&self) -> CentralScreen {
        match self {
            ParkingSensor::Front | ParkingSensor::Rear => CentralScreen::SensorsForward,
            ParkingSensor::Left => CentralScreen::SensorsBlind,
            ParkingSensor::Right => CentralScreen::Modes,
        }
    }
}

/// Caller-driven command over the fixed action set.
///
/// The variants are matched exhaustively in the binder handle, so adding an
/// action is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterAction {
    /// Adjust the cruise-control set speed.
    Speed(SpeedAction),
    /// Flip the cruise-control engagement flag.
    ToggleCruiseControl,
    /// Flip the location-sharing flag.
    ToggleShareLocation,
    /// Switch the central screen to a sensor view.
    ParkingSensor(ParkingSensor),
}

/// Apply a speed step with clamping.
pub fn step_set_speed(current: i32, action: SpeedAction) -> i32 {
    match action {
        SpeedAction::Increase => (current + SPEED_STEP).min(MAX_SET_SPEED),
        SpeedAction::Decrease => (current - SPEED_STEP).max(MIN_SET_SPEED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_steps_clamp_at_both_ends() {
        assert_eq!(step_set_speed(0, SpeedAction::Increase), 10);
        assert_eq!(step_set_speed(215, SpeedAction::Increase), 220);
        assert_eq!(step_set_speed(220, SpeedAction::Increase), 220);
        assert_eq!(step_set_speed(10, SpeedAction::Decrease), 0);
        assert_eq!(step_set_speed(0, SpeedAction::Decrease), 0);
    }

    #[test]
    fn sensor_views_map_to_screens() {
        assert_eq!(ParkingSensor::Front.screen(), CentralScreen::SensorsForward);
        assert_eq!(ParkingSensor::Rear.screen(), CentralScreen::SensorsForward);
        assert_eq!(ParkingSensor::Left.screen(), CentralScreen::SensorsBlind);
        assert_eq!(ParkingSensor::Right.screen(), CentralScreen::Modes);
    }
}
