use duel_shared::*;
use tracing::debug;

use super::tactics::*;
use crate::actions::ActionSpace;
use crate::learning::QLearningAgent;
use crate::policy::Controller;
use crate::state::{encode_reduced_state, StateInputs};

/// Approaches from range and circles at close range, firing on the heuristic
/// trigger only while circling. Learns the turret declination from an immediate
/// per-tick reward over the reduced state.
pub struct Gunner {
    agent: QLearningAgent,
    driver: Driver,
    trigger: FireTrigger,
    miss_penalty: f64,
    prev_health: Option<f32>,
    stats: ShotStats,
}

impl Gunner {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            agent: QLearningAgent::new(ActionSpace::aiming(&config.actions), &config.learning),
            driver: Driver::approach_then_orbit(&config.driving),
            trigger: FireTrigger::new(config.driving.fire_angle_threshold),
            miss_penalty: config.reward.miss_penalty,
            prev_health: None,
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

impl Controller for Gunner {
    fn name(&self) -> &str {
        "gunner"
    }

    fn act(&mut self, me: &TelemetryFrame, enemy: &TelemetryFrame) -> Command {
        let s = assess(me, enemy);
        let steer = self.driver.steer(me, enemy, s.distance);
        let fire = self.driver.mode() == DriveMode::Orbit && self.trigger.check(steer.bearing);

        // declination is commanded but never part of the state
        let state = encode_reduced_state(&StateInputs {
            me,
            enemy,
            bearing: steer.bearing,
            distance: s.distance,
            turret_bearing: s.lock,
            declination: 0.0,
            thrust: steer.thrust,
            steering: steer.steering,
            prev_enemy: enemy.position(),
        });

        let idx = self.agent.select_action(&state);
        let declination = self.agent.actions().get(idx).map_or(0.0, |a| a.declination);

        let reward = self.reward(fire, enemy.health);
        self.agent.update(&state, idx, reward, &state);

        if fire {
            self.stats.fired += 1;
            if self.prev_health.is_some() {
                self.stats.resolved += 1;
                if reward > 0.0 {
                    self.stats.hits += 1;
                }
            }
            debug!(action = idx, reward, "gunner shot");
        }
        self.stats.total_reward += reward;
        self.prev_health = Some(enemy.health);

        Command {
            thrust: steer.thrust,
            steering: steer.steering,
            turret_declination: declination,
            turret_bearing: s.lock,
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
