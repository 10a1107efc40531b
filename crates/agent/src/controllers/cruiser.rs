use duel_shared::*;

use crate::policy::Controller;

/// Drives straight ahead at full thrust while within `radius` of the arena origin,
/// then stops. Never aims or fires.
pub struct Cruiser {
    radius: f32,
}

impl Cruiser {
    pub fn new(config: &DrivingConfig) -> Self {
        Self {
            radius: config.cruise_radius,
        }
    }
}

impl Controller for Cruiser {
    fn name(&self) -> &str {
        "cruiser"
    }

    fn act(&mut self, me: &TelemetryFrame, _enemy: &TelemetryFrame) -> Command {
        if me.position().length() < self.radius {
            Command {
                thrust: FULL_THRUST,
                ..Command::none()
            }
        } else {
            Command::none()
        }
    }
}
