use std::collections::VecDeque;

use duel_shared::{RewardConfig, ShotStats};
use tracing::debug;

use crate::learning::QLearningAgent;
use crate::state::StateKey;

/// A fire decision waiting for its consequence to show up in the enemy's health.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingShot {
    pub state: StateKey,
    pub action: usize,
    /// Ticks left before the shot is judged.
    pub delay: i32,
    pub enemy_health: f32,
}

/// A shot that has been judged and fed back to the learner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotOutcome {
    pub action: usize,
    pub reward: f64,
    pub hit: bool,
    pub health_at_fire: f32,
    pub health_now: f32,
}

/// Correlates fire decisions with enemy-health changes observed `delay` ticks later.
pub struct DelayedRewardTracker {
    config: RewardConfig,
    pending: VecDeque<PendingShot>,
    /// Set while a shot is in flight; guards the fire branch in single-flight mode.
    awaiting_result: bool,
    last_fire: Option<(StateKey, usize)>,
    stats: ShotStats,
}

impl DelayedRewardTracker {
    pub fn new(config: RewardConfig) -> Self {
        Self {
            config,
            pending: VecDeque::new(),
            awaiting_result: false,
            last_fire: None,
            stats: ShotStats::default(),
        }
    }

    /// Whether a new fire decision may be taken this tick.
    pub fn can_fire(&self) -> bool {
        !(self.config.single_flight && self.awaiting_result)
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting_result
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingShot> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> ShotStats {
        self.stats
    }

    pub fn record_fire(&mut self, state: StateKey, action: usize, enemy_health: f32) {
        self.pending.push_back(PendingShot {
            state,
            action,
            delay: self.config.shot_delay_ticks,
            enemy_health,
        });
        self.awaiting_result = true;
        self.last_fire = Some((state, action));
        self.stats.fired += 1;
    }

    /// Scaled health drop on a hit, the miss penalty otherwise.
    pub fn reward_for(&self, health_at_fire: f32, health_now: f32) -> f64 {
        let drop = (health_at_fire - health_now) as f64;
        if drop > 0.0 {
            drop * self.config.hit_reward_scale
        } else {
            self.config.miss_penalty
        }
    }

    /// Count every pending shot down by one tick and resolve the ones that are due.
    pub fn advance(
        &mut self,
        agent: &mut QLearningAgent,
        enemy_health: f32,
        current_state: &StateKey,
    ) -> Vec<ShotOutcome> {
        for shot in self.pending.iter_mut() {
            shot.delay -= 1;
        }

        let mut outcomes = Vec::new();
        while let Some(pos) = self.pending.iter().position(|s| s.delay <= 0) {
            let Some(shot) = self.pending.remove(pos) else {
                break;
            };
            let reward = self.reward_for(shot.enemy_health, enemy_health);
            let hit = reward > 0.0;
            agent.update(&shot.state, shot.action, reward, current_state);

            debug!(
                action = shot.action,
                health_at_fire = shot.enemy_health,
                health_now = enemy_health,
                reward,
                "shot resolved"
            );

            self.stats.resolved += 1;
            self.stats.total_reward += reward;
            if hit {
                self.stats.hits += 1;
            }
            outcomes.push(ShotOutcome {
                action: shot.action,
                reward,
                hit,
                health_at_fire: shot.enemy_health,
                health_now: enemy_health,
            });
        }

        if self.pending.is_empty() {
            self.awaiting_result = false;
        }
        outcomes
    }

    /// Credit the most recent fire decision with the destroy bonus.
    pub fn credit_destroy(&mut self, agent: &mut QLearningAgent, current_state: &StateKey) -> Option<f64> {
        let (state, action) = self.last_fire?;
        let bonus = self.config.destroy_bonus;
        agent.update(&state, action, bonus, current_state);
        self.stats.total_reward += bonus;
        Some(bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionSpace;
    use duel_shared::{ActionConfig, LearningConfig, STATE_DIMS};

    fn key(v: i32) -> StateKey {
        StateKey([v; STATE_DIMS])
    }

    fn agent() -> QLearningAgent {
        let config = LearningConfig {
            seed: Some(1),
            ..Default::default()
        };
        QLearningAgent::new(ActionSpace::combined(&ActionConfig::default()), &config)
    }

    #[test]
    fn test_resolves_after_exactly_delay_ticks() {
        let mut agent = agent();
        let mut tracker = DelayedRewardTracker::new(RewardConfig::default());
        tracker.record_fire(key(0), 70, 100.0);

        for tick in 1..150 {
            let out = tracker.advance(&mut agent, 100.0, &key(1));
            assert!(out.is_empty(), "resolved early at tick {tick}");
            assert_eq!(tracker.pending_len(), 1);
        }
        let out = tracker.advance(&mut agent, 100.0, &key(1));
        assert_eq!(out.len(), 1);
        assert_eq!(tracker.pending_len(), 0);

        for _ in 0..300 {
            assert!(tracker.advance(&mut agent, 100.0, &key(1)).is_empty());
        }
        assert_eq!(tracker.stats().resolved, 1);
    }

    #[test]
    fn test_hit_reward_scaled() {
        let mut agent = agent();
        let mut tracker = DelayedRewardTracker::new(RewardConfig::default());
        tracker.record_fire(key(0), 70, 100.0);
        let mut outcomes = Vec::new();
        for _ in 0..150 {
            outcomes.extend(tracker.advance(&mut agent, 80.0, &key(1)));
        }
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].reward, 400.0);
        assert!(outcomes[0].hit);
        assert!(agent.table().value(&key(0), 70) > 0.0);
        assert_eq!(tracker.stats().hits, 1);
    }

    #[test]
    fn test_miss_penalty() {
        let mut agent = agent();
        let mut tracker = DelayedRewardTracker::new(RewardConfig::default());
        tracker.record_fire(key(0), 70, 100.0);
        let mut outcomes = Vec::new();
        for _ in 0..150 {
            outcomes.extend(tracker.advance(&mut agent, 100.0, &key(1)));
        }
        assert_eq!(outcomes[0].reward, -50.0);
        assert!(!outcomes[0].hit);
        assert!(agent.table().value(&key(0), 70) < 0.0);
    }

    #[test]
    fn test_health_gain_is_a_miss() {
        let tracker = DelayedRewardTracker::new(RewardConfig::default());
        assert_eq!(tracker.reward_for(80.0, 95.0), -50.0);
        assert_eq!(tracker.reward_for(80.0, 80.0), -50.0);
        assert_eq!(tracker.reward_for(80.0, 79.5), 10.0);
    }

    #[test]
    fn test_single_flight_gate() {
        let mut agent = agent();
        let mut tracker = DelayedRewardTracker::new(RewardConfig {
            shot_delay_ticks: 3,
            ..Default::default()
        });
        assert!(tracker.can_fire());
        tracker.record_fire(key(0), 70, 100.0);
        assert!(!tracker.can_fire());
        assert!(tracker.is_awaiting());

        tracker.advance(&mut agent, 100.0, &key(0));
        tracker.advance(&mut agent, 100.0, &key(0));
        assert!(!tracker.can_fire());
        tracker.advance(&mut agent, 100.0, &key(0));
        assert!(tracker.can_fire());
        assert!(!tracker.is_awaiting());
    }

    #[test]
    fn test_multi_flight_each_shot_uses_own_health() {
        let mut agent = agent();
        let mut tracker = DelayedRewardTracker::new(RewardConfig {
            shot_delay_ticks: 2,
            single_flight: false,
            ..Default::default()
        });
        tracker.record_fire(key(0), 66, 100.0);
        assert!(tracker.can_fire());
        assert!(tracker.advance(&mut agent, 100.0, &key(0)).is_empty());

        tracker.record_fire(key(1), 67, 90.0);
        let first = tracker.advance(&mut agent, 90.0, &key(0));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].action, 66);
        assert_eq!(first[0].reward, 200.0);
        assert!(tracker.is_awaiting());

        let second = tracker.advance(&mut agent, 90.0, &key(0));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].action, 67);
        assert_eq!(second[0].reward, -50.0);
        assert!(!tracker.is_awaiting());
    }

    #[test]
    fn test_destroy_bonus_needs_a_shot() {
        let mut agent = agent();
        let mut tracker = DelayedRewardTracker::new(RewardConfig::default());
        assert_eq!(tracker.credit_destroy(&mut agent, &key(0)), None);

        tracker.record_fire(key(2), 100, 60.0);
        assert_eq!(tracker.credit_destroy(&mut agent, &key(0)), Some(5000.0));
        assert!((agent.table().value(&key(2), 100) - 500.0).abs() < 1e-9);
    }
}
