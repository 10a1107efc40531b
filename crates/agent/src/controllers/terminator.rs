use duel_shared::*;
use glam::Vec2;
use tracing::{debug, info};

use super::tactics::*;
use crate::actions::ActionSpace;
use crate::learning::QLearningAgent;
use crate::policy::Controller;
use crate::rewards::DelayedRewardTracker;
use crate::state::{encode_state, StateInputs, StateKey};

/// Learns when to fire and how to aim. Fire decisions are credited by the enemy
/// health change observed after the shot delay; destroying the enemy credits the
/// most recent fire decision with a bonus.
pub struct Terminator {
    agent: QLearningAgent,
    tracker: DelayedRewardTracker,
    driver: Driver,
    /// Declination chosen by the last selected action; held while a shot pends.
    declination: f32,
    prev_enemy: Option<Vec2>,
    last_state: Option<StateKey>,
}

impl Terminator {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            agent: QLearningAgent::new(ActionSpace::combined(&config.actions), &config.learning),
            tracker: DelayedRewardTracker::new(config.reward),
            driver: Driver::approach_then_orbit(&config.driving),
            declination: 0.0,
            prev_enemy: None,
            last_state: None,
        }
    }

    pub fn tracker(&self) -> &DelayedRewardTracker {
        &self.tracker
    }
}

impl Controller for Terminator {
    fn name(&self) -> &str {
        "terminator"
    }

    fn act(&mut self, me: &TelemetryFrame, enemy: &TelemetryFrame) -> Command {
        let s = assess(me, enemy);
        let steer = self.driver.steer(me, enemy, s.distance);
        let prev_enemy = self.prev_enemy.unwrap_or_else(|| enemy.position());

        let state = encode_state(&StateInputs {
            me,
            enemy,
            bearing: steer.bearing,
            distance: s.distance,
            turret_bearing: s.lock,
            declination: 0.0,
            thrust: steer.thrust,
            steering: steer.steering,
            prev_enemy,
        });

        let mut turret_bearing = s.lock;
        let mut fire = false;
        if self.tracker.can_fire() {
            let idx = self.agent.select_action(&state);
            if let Some(action) = self.agent.actions().get(idx).copied() {
                turret_bearing += action.correction;
                self.declination = action.declination;
                if action.fire {
                    fire = true;
                    self.tracker.record_fire(state, idx, enemy.health);
                    debug!(
                        action = idx,
                        declination = action.declination,
                        correction = action.correction,
                        enemy_health = enemy.health,
                        "fire"
                    );
                }
            }
        }

        self.tracker.advance(&mut self.agent, enemy.health, &state);

        self.prev_enemy = Some(enemy.position());
        self.last_state = Some(state);

        Command {
            thrust: steer.thrust,
            steering: steer.steering,
            turret_declination: self.declination,
            turret_bearing,
            fire,
        }
    }

    fn on_terminal(&mut self, reason: EpisodeEndReason, _me: &TelemetryFrame, _enemy: &TelemetryFrame) {
        if reason != EpisodeEndReason::EnemyDestroyed {
            return;
        }
        let Some(state) = self.last_state else {
            return;
        };
        if let Some(bonus) = self.tracker.credit_destroy(&mut self.agent, &state) {
            info!(bonus, "enemy destroyed, last shot credited");
        }
    }

    fn learner(&self) -> Option<&QLearningAgent> {
        Some(&self.agent)
    }

    fn learner_mut(&mut self) -> Option<&mut QLearningAgent> {
        Some(&mut self.agent)
    }

    fn stats(&self) -> ShotStats {
        self.tracker.stats()
    }
}
