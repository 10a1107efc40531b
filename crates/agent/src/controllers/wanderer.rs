use duel_shared::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use super::tactics::*;
use crate::policy::Controller;

/// Approach steering computed from the enemy bearing rotated by a random offset
/// instead of the frame rotation, so the tank heads off at a fixed skew to the
/// enemy. The offset is drawn once per episode. Turret locked, never fires.
pub struct Wanderer {
    driver: Driver,
    offset: f32,
}

impl Wanderer {
    pub fn new(config: &ControllerConfig) -> Self {
        let mut rng = match config.learning.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_entropy(),
        };
        let offset = rng.gen_range(0.0..360.0);
        Self::with_offset(&config.driving, offset)
    }

    pub fn with_offset(config: &DrivingConfig, offset: f32) -> Self {
        Self {
            driver: Driver::pursuit(config.approach_distance).with_approach_offset(offset),
            offset,
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }
}

impl Controller for Wanderer {
    fn name(&self) -> &str {
        "wanderer"
    }

    fn act(&mut self, me: &TelemetryFrame, enemy: &TelemetryFrame) -> Command {
        let s = assess(me, enemy);
        let steer = self.driver.steer(me, enemy, s.distance);
        Command {
            thrust: steer.thrust,
            steering: steer.steering,
            turret_declination: 0.0,
            turret_bearing: s.lock,
            fire: false,
        }
    }
}
