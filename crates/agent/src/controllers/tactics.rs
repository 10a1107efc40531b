use duel_shared::*;

use crate::geometry::*;

/// Last fire angle before any shot has been taken.
pub const INITIAL_FIRE_ANGLE: f32 = -3.0;

/// Geometry shared by every controller for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct Situation {
    pub distance: f32,
    /// Bearing to the enemy, degrees.
    pub bearing: f32,
    /// Turret bearing that points at the enemy, before any correction.
    pub lock: f32,
}

pub fn assess(me: &TelemetryFrame, enemy: &TelemetryFrame) -> Situation {
    Situation {
        distance: distance(me, enemy),
        bearing: bearing_to(me, enemy),
        lock: turret_lock_bearing(me, enemy),
    }
}

/// Which steering rule produced the current cycle's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    Approach,
    Orbit,
    /// Between the thresholds: the previous decision is reused.
    Hold,
}

/// Picks approach or orbit steering by range and remembers the last decision.
#[derive(Debug, Clone)]
pub struct Driver {
    /// Approach while farther than this.
    approach_beyond: f32,
    /// Orbit while closer than this; wins over approach when both apply.
    orbit_within: Option<f32>,
    /// Rotation applied to the approach bearing.
    approach_offset: f32,
    last: Option<Steering>,
    mode: DriveMode,
}

impl Driver {
    /// Approach-only pursuit while farther than `approach_beyond`.
    pub fn pursuit(approach_beyond: f32) -> Self {
        Self {
            approach_beyond,
            orbit_within: None,
            approach_offset: FRAME_OFFSET,
            last: None,
            mode: DriveMode::Hold,
        }
    }

    pub fn approach_then_orbit(config: &DrivingConfig) -> Self {
        Self {
            orbit_within: Some(config.orbit_distance),
            ..Self::pursuit(config.approach_distance)
        }
    }

    /// Approach along the bearing rotated by `offset` rather than the frame rotation.
    pub fn with_approach_offset(mut self, offset: f32) -> Self {
        self.approach_offset = offset;
        self
    }

    /// Steering for this cycle. Between the two thresholds the previous decision is
    /// kept; with no previous decision the tank approaches.
    pub fn steer(&mut self, me: &TelemetryFrame, enemy: &TelemetryFrame, range: f32) -> Steering {
        let orbit = self.orbit_within.is_some_and(|within| range < within);
        self.mode = if orbit {
            DriveMode::Orbit
        } else if range > self.approach_beyond || self.last.is_none() {
            DriveMode::Approach
        } else {
            DriveMode::Hold
        };

        let steering = match (self.mode, self.last) {
            (DriveMode::Orbit, _) => orbit_steering(me, enemy),
            (DriveMode::Hold, Some(last)) => last,
            _ => approach_steering_offset(me, enemy, self.approach_offset),
        };
        self.last = Some(steering);
        steering
    }

    /// Mode of the most recent [`Driver::steer`] call.
    pub fn mode(&self) -> DriveMode {
        self.mode
    }
}

/// Heuristic trigger: fire whenever the bearing to the enemy has moved by at least
/// `threshold` degrees since the last shot.
#[derive(Debug, Clone)]
pub struct FireTrigger {
    last_angle: f32,
    threshold: f32,
}

impl FireTrigger {
    pub fn new(threshold: f32) -> Self {
        Self {
            last_angle: INITIAL_FIRE_ANGLE,
            threshold,
        }
    }

    pub fn check(&mut self, bearing: f32) -> bool {
        if (bearing - self.last_angle).abs() >= self.threshold {
            self.last_angle = bearing;
            true
        } else {
            false
        }
    }

    pub fn last_angle(&self) -> f32 {
        self.last_angle
    }
}
