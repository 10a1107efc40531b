use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{CMD_FIRE, CMD_NORMAL, CMD_RESET, RESERVED_CHANNELS};

/// One decoded telemetry snapshot for a single participant at a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub timer: u64,
    pub number: i32,
    pub fps: f32,
    pub status: i32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Hull bearing in degrees, 0..360.
    pub bearing: f32,
    pub pitch: f32,
    pub roll: f32,
    pub speed: f32,
    pub health: f32,
    pub power: f32,
    pub turret_bearing: f32,
    pub turret_declination: f32,
    pub thrust: f32,
    pub steering: f32,
    pub reserved: [f32; RESERVED_CHANNELS],
}

impl TelemetryFrame {
    /// Planar position (x, z).
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    /// Frame for `number` at the given planar position, everything else neutral.
    pub fn at(number: i32, x: f32, z: f32, bearing: f32) -> Self {
        Self {
            timer: 0,
            number,
            fps: 0.0,
            status: 0,
            x,
            y: 0.0,
            z,
            bearing,
            pitch: 0.0,
            roll: 0.0,
            speed: 0.0,
            health: 1000.0,
            power: 1000.0,
            turret_bearing: 0.0,
            turret_declination: 0.0,
            thrust: 0.0,
            steering: 0.0,
            reserved: [0.0; RESERVED_CHANNELS],
        }
    }
}

/// The per-cycle decision produced by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub thrust: f32,
    pub steering: f32,
    pub turret_declination: f32,
    pub turret_bearing: f32,
    pub fire: bool,
}

impl Command {
    pub fn none() -> Self {
        Self {
            thrust: 0.0,
            steering: 0.0,
            turret_declination: 0.0,
            turret_bearing: 0.0,
            fire: false,
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandCode {
    Normal,
    Fire,
    Reset,
}

impl CommandCode {
    pub fn to_raw(self) -> i32 {
        match self {
            CommandCode::Normal => CMD_NORMAL,
            CommandCode::Fire => CMD_FIRE,
            CommandCode::Reset => CMD_RESET,
        }
    }

    /// Unknown codes read back as `Normal`; the simulator treats them the same way.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            CMD_FIRE => CommandCode::Fire,
            CMD_RESET => CommandCode::Reset,
            _ => CommandCode::Normal,
        }
    }
}

/// Everything that goes into one outbound command datagram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommandFrame {
    pub controlling_id: i32,
    pub thrust: f32,
    pub steering: f32,
    pub turret_declination: f32,
    pub yaw: f32,
    pub turret_bearing: f32,
    pub bank: f32,
    pub faction: i32,
    pub timer: u64,
    pub code: CommandCode,
    pub spawn_id: i32,
    pub island_type: i32,
    pub target_x: f32,
    pub target_y: f32,
    pub target_z: f32,
    pub target: i32,
    pub bit: bool,
    pub weapon: i32,
}

impl CommandFrame {
    pub fn new(controlling_id: i32, timer: u64, command: &Command, code: CommandCode) -> Self {
        Self {
            controlling_id,
            thrust: command.thrust,
            steering: command.steering,
            turret_declination: command.turret_declination,
            yaw: 0.0,
            turret_bearing: command.turret_bearing,
            bank: 0.0,
            faction: crate::DEFAULT_FACTION,
            timer,
            code,
            spawn_id: 0,
            island_type: 0,
            target_x: 0.0,
            target_y: 0.0,
            target_z: 0.0,
            target: 0,
            bit: false,
            weapon: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeEndReason {
    EnemyDestroyed,
    TimeLimit,
    PowerDepleted,
    ChannelTimeout,
}

impl EpisodeEndReason {
    /// Scripted terminations restart the simulator; a timeout means it already stopped.
    pub fn sends_reset(&self) -> bool {
        !matches!(self, EpisodeEndReason::ChannelTimeout)
    }
}

/// Outcome of one episode, as reported by the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub controller: String,
    pub reason: EpisodeEndReason,
    pub final_timer: u64,
    pub cycles: u64,
    pub commands_sent: u64,
    pub send_failures: u64,
    pub dropped_frames: u64,
    pub discarded_frames: u64,
    pub stats: ShotStats,
    pub q_states: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotStats {
    pub fired: u32,
    pub resolved: u32,
    pub hits: u32,
    pub total_reward: f64,
}

impl ShotStats {
    pub fn hit_rate(&self) -> f32 {
        if self.resolved == 0 {
            0.0
        } else {
            self.hits as f32 / self.resolved as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_code_raw_values() {
        assert_eq!(CommandCode::Normal.to_raw(), 0);
        assert_eq!(CommandCode::Fire.to_raw(), 11);
        assert_eq!(CommandCode::Reset.to_raw(), 13);
        assert_eq!(CommandCode::from_raw(11), CommandCode::Fire);
        assert_eq!(CommandCode::from_raw(99), CommandCode::Normal);
    }

    #[test]
    fn test_command_frame_reserved_fields_zero() {
        let cmd = Command {
            thrust: 10.0,
            steering: -4.0,
            turret_declination: 1.0,
            turret_bearing: 270.0,
            fire: true,
        };
        let frame = CommandFrame::new(2, 77, &cmd, CommandCode::Fire);
        assert_eq!(frame.controlling_id, 2);
        assert_eq!(frame.timer, 77);
        assert_eq!(frame.faction, 1);
        assert_eq!(frame.spawn_id, 0);
        assert_eq!(frame.weapon, 0);
        assert!(!frame.bit);
        assert_eq!(frame.turret_bearing, 270.0);
    }

    #[test]
    fn test_timeout_does_not_send_reset() {
        assert!(!EpisodeEndReason::ChannelTimeout.sends_reset());
        assert!(EpisodeEndReason::EnemyDestroyed.sends_reset());
        assert!(EpisodeEndReason::TimeLimit.sends_reset());
        assert!(EpisodeEndReason::PowerDepleted.sends_reset());
    }

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(ShotStats::default().hit_rate(), 0.0);
    }
}
