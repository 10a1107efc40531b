use duel_shared::{Command, EpisodeEndReason, ShotStats, TelemetryFrame};

use crate::learning::QLearningAgent;

pub trait Controller: Send {
    fn name(&self) -> &str;

    /// Decide this cycle's command from the two resolved frames.
    fn act(&mut self, me: &TelemetryFrame, enemy: &TelemetryFrame) -> Command;

    /// Called once on a scripted termination, before the final command goes out.
    fn on_terminal(&mut self, _reason: EpisodeEndReason, _me: &TelemetryFrame, _enemy: &TelemetryFrame) {}

    /// The learner behind this controller, if it has one.
    fn learner(&self) -> Option<&QLearningAgent> {
        None
    }

    fn learner_mut(&mut self) -> Option<&mut QLearningAgent> {
        None
    }

    fn stats(&self) -> ShotStats {
        ShotStats::default()
    }
}

/// Controller that does nothing - useful for testing.
pub struct IdleController;

impl Controller for IdleController {
    fn name(&self) -> &str {
        "idle"
    }

    fn act(&mut self, _me: &TelemetryFrame, _enemy: &TelemetryFrame) -> Command {
        Command::none()
    }
}
