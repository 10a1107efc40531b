use duel_shared::*;

use super::tactics::*;
use crate::policy::Controller;

/// Approaches from range and circles the enemy up close, firing on the heuristic trigger.
pub struct Orbiter {
    driver: Driver,
    trigger: FireTrigger,
    stats: ShotStats,
}

impl Orbiter {
    pub fn new(config: &DrivingConfig) -> Self {
        Self {
            driver: Driver::approach_then_orbit(config),
            trigger: FireTrigger::new(config.fire_angle_threshold),
            stats: ShotStats::default(),
        }
    }
}

impl Controller for Orbiter {
    fn name(&self) -> &str {
        "orbiter"
    }

    fn act(&mut self, me: &TelemetryFrame, enemy: &TelemetryFrame) -> Command {
        let s = assess(me, enemy);
        let steer = self.driver.steer(me, enemy, s.distance);
        let fire = self.trigger.check(s.bearing);
        if fire {
            self.stats.fired += 1;
        }

        Command {
            thrust: steer.thrust,
            steering: steer.steering,
            turret_declination: 0.0,
            turret_bearing: s.lock,
            fire,
        }
    }

    fn stats(&self) -> ShotStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::orbit_steering;

    #[test]
    fn test_orbiter_circles_up_close() {
        let mut orbiter = Orbiter::new(&DrivingConfig::default());
        let me = TelemetryFrame::at(1, 0.0, 0.0, 175.0);
        let enemy = TelemetryFrame::at(2, 50.0, 0.0, 0.0);
        let cmd = orbiter.act(&me, &enemy);
        let expected = orbit_steering(&me, &enemy);
        assert_eq!(cmd.steering, expected.steering);
        assert_eq!(cmd.thrust, expected.thrust);
    }
}
