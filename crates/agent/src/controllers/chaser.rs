use duel_shared::*;

use super::tactics::*;
use crate::policy::Controller;

/// Pure pursuit: approach while farther than the approach distance and keep the
/// turret on the enemy, offset by a fixed bias. Never fires.
pub struct Chaser {
    driver: Driver,
    turret_bias: f32,
}

impl Chaser {
    pub fn new(config: &DrivingConfig) -> Self {
        Self {
            driver: Driver::pursuit(config.approach_distance),
            turret_bias: config.turret_bias,
        }
    }
}

impl Controller for Chaser {
    fn name(&self) -> &str {
        "chaser"
    }

    fn act(&mut self, me: &TelemetryFrame, enemy: &TelemetryFrame) -> Command {
        let s = assess(me, enemy);
        let steer = self.driver.steer(me, enemy, s.distance);

        Command {
            thrust: steer.thrust,
            steering: steer.steering,
            turret_declination: 0.0,
            turret_bearing: s.lock + self.turret_bias,
            fire: false,
        }
    }
}
