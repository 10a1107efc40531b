use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("participant must be 1 or 2, got {0}")]
    InvalidParticipant(i32),
    #[error("unknown controller '{0}' (valid: cruiser, wanderer, chaser, orbiter, gunner, marksman, terminator)")]
    UnknownController(String),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Which controller variant drives the tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    /// Straight run while inside the cruise radius.
    Cruiser,
    /// Approach along a bearing skewed by a random offset drawn once; never fires.
    Wanderer,
    /// Approach with a biased turret lock; never fires.
    Chaser,
    /// Approach far, orbit near, heuristic fire.
    Orbiter,
    /// Approach far, orbit near, fire while orbiting; learns turret declination only.
    Gunner,
    /// Heuristic fire, learned declination and bearing correction.
    Marksman,
    /// Learned fire/declination/correction with delayed rewards.
    #[default]
    Terminator,
}

impl ControllerKind {
    pub const ALL: [ControllerKind; 7] = [
        ControllerKind::Cruiser,
        ControllerKind::Wanderer,
        ControllerKind::Chaser,
        ControllerKind::Orbiter,
        ControllerKind::Gunner,
        ControllerKind::Marksman,
        ControllerKind::Terminator,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ControllerKind::Cruiser => "cruiser",
            ControllerKind::Wanderer => "wanderer",
            ControllerKind::Chaser => "chaser",
            ControllerKind::Orbiter => "orbiter",
            ControllerKind::Gunner => "gunner",
            ControllerKind::Marksman => "marksman",
            ControllerKind::Terminator => "terminator",
        }
    }

    pub fn learns(&self) -> bool {
        matches!(
            self,
            ControllerKind::Gunner | ControllerKind::Marksman | ControllerKind::Terminator
        )
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControllerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ControllerKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| ConfigError::UnknownController(s.to_string()))
    }
}

/// What to do when a Q-table load is requested but the file does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTable {
    #[default]
    Fail,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub epsilon: f64,
    /// Seed for exploration; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: LEARNING_RATE,
            discount_factor: DISCOUNT_FACTOR,
            epsilon: EPSILON,
            seed: None,
        }
    }
}

impl LearningConfig {
    /// Per-tick learners: longer horizon, more exploration.
    pub fn per_tick() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.95,
            epsilon: 0.1,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub shot_delay_ticks: i32,
    pub hit_reward_scale: f64,
    pub miss_penalty: f64,
    pub destroy_bonus: f64,
    /// At most one shot awaiting resolution.
    pub single_flight: bool,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            shot_delay_ticks: SHOT_DELAY_TICKS,
            hit_reward_scale: HIT_REWARD_SCALE,
            miss_penalty: MISS_PENALTY,
            destroy_bonus: DESTROY_BONUS,
            single_flight: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    pub declination_levels: usize,
    pub declination_max: f32,
    pub correction_levels: usize,
    pub correction_span: f32,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            declination_levels: DECLINATION_LEVELS,
            declination_max: DECLINATION_MAX,
            correction_levels: CORRECTION_LEVELS,
            correction_span: CORRECTION_SPAN,
        }
    }
}

impl ActionConfig {
    /// Whole-degree grid: declination 0..=5, correction -5..=5.
    pub fn integer() -> Self {
        Self {
            declination_levels: 6,
            declination_max: 5.0,
            correction_levels: 11,
            correction_span: 5.0,
        }
    }

    /// Declination 0 or 1 and no bearing correction.
    pub fn declination_only() -> Self {
        Self {
            declination_levels: 2,
            declination_max: 1.0,
            correction_levels: 1,
            correction_span: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivingConfig {
    pub approach_distance: f32,
    pub orbit_distance: f32,
    pub cruise_radius: f32,
    pub fire_angle_threshold: f32,
    /// Added to the turret lock by variants that do not learn a correction.
    pub turret_bias: f32,
}

impl Default for DrivingConfig {
    fn default() -> Self {
        Self {
            approach_distance: APPROACH_DISTANCE,
            orbit_distance: ORBIT_DISTANCE,
            cruise_radius: CRUISE_RADIUS,
            fire_angle_threshold: FIRE_ANGLE_THRESHOLD,
            turret_bias: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    pub destroyed_health: f32,
    pub time_limit_ticks: u64,
    pub min_power: f32,
    pub recv_timeout_secs: u64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            destroyed_health: DESTROYED_HEALTH,
            time_limit_ticks: TIME_LIMIT_TICKS,
            min_power: MIN_POWER,
            recv_timeout_secs: RECV_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub q_table_path: PathBuf,
    pub load_q_table: bool,
    pub on_missing: MissingTable,
    /// Directory for CSV episode logs; `None` disables recording.
    pub record_dir: Option<PathBuf>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            q_table_path: PathBuf::from(DEFAULT_Q_TABLE_PATH),
            load_q_table: false,
            on_missing: MissingTable::Fail,
            record_dir: None,
        }
    }
}

/// Full configuration of one controller process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub participant: i32,
    pub kind: ControllerKind,
    pub learning: LearningConfig,
    pub reward: RewardConfig,
    pub actions: ActionConfig,
    pub driving: DrivingConfig,
    pub episode: EpisodeConfig,
    pub persistence: PersistenceConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            participant: PARTICIPANT_ONE,
            kind: ControllerKind::default(),
            learning: LearningConfig::default(),
            reward: RewardConfig::default(),
            actions: ActionConfig::default(),
            driving: DrivingConfig::default(),
            episode: EpisodeConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Defaults for a given variant. Variants differ in learning rates, action grid,
    /// driving thresholds and miss penalty.
    pub fn for_kind(kind: ControllerKind) -> Self {
        let mut config = Self {
            kind,
            ..Default::default()
        };
        match kind {
            ControllerKind::Cruiser | ControllerKind::Orbiter | ControllerKind::Terminator => {}
            ControllerKind::Wanderer => {
                config.driving.approach_distance = 0.0;
            }
            ControllerKind::Chaser => {
                config.driving.approach_distance = 1.0;
                config.driving.turret_bias = 1.0;
            }
            ControllerKind::Gunner => {
                config.learning = LearningConfig::per_tick();
                config.actions = ActionConfig::declination_only();
                config.reward.miss_penalty = -10.0;
                config.driving.orbit_distance = 500.0;
                config.driving.fire_angle_threshold = 0.1;
            }
            ControllerKind::Marksman => {
                config.learning = LearningConfig::per_tick();
                config.actions = ActionConfig::integer();
                config.driving.approach_distance = 0.0;
            }
        }
        config
    }

    /// Load from a JSON file; absent fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        participant_slot(self.participant)?;
        if !(0.0..=1.0).contains(&self.learning.epsilon) {
            return Err(ConfigError::Invalid {
                field: "learning.epsilon",
                reason: format!("{} is not a probability", self.learning.epsilon),
            });
        }
        if self.actions.declination_levels == 0 || self.actions.correction_levels == 0 {
            return Err(ConfigError::Invalid {
                field: "actions",
                reason: "every action dimension needs at least one level".into(),
            });
        }
        if self.reward.shot_delay_ticks < 1 {
            return Err(ConfigError::Invalid {
                field: "reward.shot_delay_ticks",
                reason: format!("{} must be at least 1", self.reward.shot_delay_ticks),
            });
        }
        Ok(())
    }

    pub fn telemetry_port(&self) -> Result<u16, ConfigError> {
        Ok(TELEMETRY_PORTS[participant_slot(self.participant)?])
    }

    pub fn command_port(&self) -> Result<u16, ConfigError> {
        Ok(COMMAND_PORTS[participant_slot(self.participant)?])
    }
}

fn participant_slot(participant: i32) -> Result<usize, ConfigError> {
    match participant {
        PARTICIPANT_ONE => Ok(0),
        PARTICIPANT_TWO => Ok(1),
        other => Err(ConfigError::InvalidParticipant(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ports_follow_participant() {
        let mut config = ControllerConfig::default();
        assert_eq!(config.telemetry_port().unwrap(), 4601);
        assert_eq!(config.command_port().unwrap(), 4501);

        config.participant = 2;
        assert_eq!(config.telemetry_port().unwrap(), 4602);
        assert_eq!(config.command_port().unwrap(), 4502);

        config.participant = 3;
        assert!(matches!(config.telemetry_port(), Err(ConfigError::InvalidParticipant(3))));
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let json = r#"{ "participant": 2, "kind": "marksman", "learning": { "epsilon": 0.3 } }"#;
        let config: ControllerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.participant, 2);
        assert_eq!(config.kind, ControllerKind::Marksman);
        assert_eq!(config.learning.epsilon, 0.3);
        assert_eq!(config.learning.learning_rate, LEARNING_RATE);
        assert_eq!(config.reward.shot_delay_ticks, 150);
        assert_eq!(config.episode.time_limit_ticks, 4900);
        assert!(config.reward.single_flight);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("orbiter".parse::<ControllerKind>().unwrap(), ControllerKind::Orbiter);
        assert!("sniper".parse::<ControllerKind>().is_err());
        for kind in ControllerKind::ALL {
            assert_eq!(kind.name().parse::<ControllerKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_marksman_preset() {
        let config = ControllerConfig::for_kind(ControllerKind::Marksman);
        assert_eq!(config.learning.discount_factor, 0.95);
        assert_eq!(config.learning.epsilon, 0.1);
        assert_eq!(config.actions, ActionConfig::integer());
        let config = ControllerConfig::for_kind(ControllerKind::Terminator);
        assert_eq!(config.learning.discount_factor, 0.2);
        assert_eq!(config.actions, ActionConfig::default());
    }

    #[test]
    fn test_gunner_and_chaser_presets() {
        let gunner = ControllerConfig::for_kind(ControllerKind::Gunner);
        assert_eq!(gunner.learning, LearningConfig::per_tick());
        assert_eq!(gunner.actions.declination_levels, 2);
        assert_eq!(gunner.actions.correction_levels, 1);
        assert_eq!(gunner.reward.miss_penalty, -10.0);
        assert_eq!(gunner.driving.approach_distance, 300.0);
        assert_eq!(gunner.driving.orbit_distance, 500.0);
        assert_eq!(gunner.driving.fire_angle_threshold, 0.1);
        assert!(gunner.validate().is_ok());

        let chaser = ControllerConfig::for_kind(ControllerKind::Chaser);
        assert_eq!(chaser.driving.turret_bias, 1.0);
        assert_eq!(chaser.driving.approach_distance, 1.0);
        assert_eq!(ControllerConfig::default().driving.turret_bias, 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_epsilon() {
        let mut config = ControllerConfig::default();
        config.learning.epsilon = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ControllerConfig::load(Path::new("/nonexistent/duel.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
