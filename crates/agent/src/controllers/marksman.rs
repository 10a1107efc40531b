use duel_shared::*;
use glam::Vec2;
use tracing::debug;

use super::tactics::*;
use crate::actions::ActionSpace;
use crate::learning::QLearningAgent;
use crate::policy::Controller;
use crate::state::{encode_state, StateInputs};

/// Pursuit with heuristic firing; learns turret declination and bearing correction
/// from an immediate per-tick reward.
///
/// A tick on which the trigger fires is rewarded by the enemy health lost since the
/// previous tick, or the miss penalty when nothing was lost. Every other tick earns zero.
pub struct Marksman {
    agent: QLearningAgent,
    driver: Driver,
    trigger: FireTrigger,
    miss_penalty: f64,
    prev_health: Option<f32>,
    prev_enemy: Option<Vec2>,
    stats: ShotStats,
}

impl Marksman {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            agent: QLearningAgent::new(ActionSpace::aiming(&config.actions), &config.learning),
            driver: Driver::pursuit(config.driving.approach_distance),
            trigger: FireTrigger::new(config.driving.fire_angle_threshold),
            miss_penalty: config.reward.miss_penalty,
            prev_health: None,
            prev_enemy: None,
            stats: ShotStats::default(),
        }
    }

    fn reward(&self, fired: bool, health_now: f32) -> f64 {
        if !fired {
            return 0.0;
        }
        match self.prev_health {
            Some(prev) if prev - health_now > 0.0 => (prev - health_now) as f64,
            Some(_) => self.miss_penalty,
            None => 0.0,
        }
    }
}

impl Controller for Marksman {
    fn name(&self) -> &str {
        "marksman"
    }

    fn act(&mut self, me: &TelemetryFrame, enemy: &TelemetryFrame) -> Command {
        let s = assess(me, enemy);
        let steer = self.driver.steer(me, enemy, s.distance);
        let fire = self.trigger.check(steer.bearing);
        let prev_enemy = self.prev_enemy.unwrap_or_else(|| enemy.position());

        let mut inputs = StateInputs {
            me,
            enemy,
            bearing: steer.bearing,
            distance: s.distance,
            turret_bearing: s.lock,
            declination: 0.0,
            thrust: steer.thrust,
            steering: steer.steering,
            prev_enemy,
        };
        let state = encode_state(&inputs);

        let idx = self.agent.select_action(&state);
        let (declination, correction) = match self.agent.actions().get(idx) {
            Some(a) => (a.declination, a.correction),
            None => (0.0, 0.0),
        };
        let turret_bearing = s.lock + correction;

        let reward = self.reward(fire, enemy.health);
        inputs.turret_bearing = turret_bearing;
        inputs.declination = declination;
        let next_state = encode_state(&inputs);
        self.agent.update(&state, idx, reward, &next_state);

        if fire {
            self.stats.fired += 1;
            if self.prev_health.is_some() {
                self.stats.resolved += 1;
                if reward > 0.0 {
                    self.stats.hits += 1;
                }
            }
            debug!(action = idx, reward, "marksman shot");
        }
        self.stats.total_reward += reward;
        self.prev_health = Some(enemy.health);
        self.prev_enemy = Some(enemy.position());

        Command {
            thrust: steer.thrust,
            steering: steer.steering,
            turret_declination: declination,
            turret_bearing,
            fire,
        }
    }

    fn learner(&self) -> Option<&QLearningAgent> {
        Some(&self.agent)
    }

    fn learner_mut(&mut self) -> Option<&mut QLearningAgent> {
        Some(&mut self.agent)
    }

    fn stats(&self) -> ShotStats {
        self.stats
    }
}
