use duel_shared::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Discretized learner state: one bucket index per dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey(pub [i32; STATE_DIMS]);

/// Everything the encoder looks at for one cycle. All of it is known before the
/// command for this cycle is sent.
#[derive(Debug, Clone, Copy)]
pub struct StateInputs<'a> {
    pub me: &'a TelemetryFrame,
    pub enemy: &'a TelemetryFrame,
    /// Bearing to the enemy, degrees.
    pub bearing: f32,
    pub distance: f32,
    pub turret_bearing: f32,
    pub declination: f32,
    pub thrust: f32,
    pub steering: f32,
    /// Enemy position on the previous cycle.
    pub prev_enemy: Vec2,
}

/// Floor-divide into a bucket. Negative values floor toward negative infinity.
pub fn bucket(value: f32, width: f32) -> i32 {
    (value as f64 / width as f64).floor() as i32
}

/// Like [`bucket`], with a tiny bias so values that land on a boundary through
/// rounding error fall on the upper side.
fn bucket_biased(value: f32, width: f32) -> i32 {
    ((value as f64 + BUCKET_EPSILON) / width as f64).floor() as i32
}

pub fn encode_state(i: &StateInputs<'_>) -> StateKey {
    let enemy_pos = i.enemy.position();
    let moved = i.prev_enemy - enemy_pos;

    StateKey([
        bucket_biased(i.bearing, BEARING_BUCKET),
        bucket_biased(i.distance, DISTANCE_BUCKET),
        bucket(i.turret_bearing, BEARING_BUCKET),
        bucket(i.declination, DECLINATION_BUCKET),
        bucket(i.thrust, THRUST_BUCKET),
        bucket(i.steering, STEERING_BUCKET),
        bucket(i.me.x, DISTANCE_BUCKET),
        bucket(i.me.z, DISTANCE_BUCKET),
        bucket(i.me.bearing, BEARING_BUCKET),
        bucket(enemy_pos.x, DISTANCE_BUCKET),
        bucket(enemy_pos.y, DISTANCE_BUCKET),
        bucket(moved.x, DISTANCE_BUCKET),
        bucket(moved.y, DISTANCE_BUCKET),
        bucket(i.enemy.bearing, BEARING_BUCKET),
    ])
}

/// Dimensions filled by [`encode_reduced_state`].
pub const REDUCED_DIMS: usize = 11;

/// Own geometry plus enemy position only: the first eleven dimensions of
/// [`encode_state`] without the boundary bias. Enemy motion and heading stay zero.
pub fn encode_reduced_state(i: &StateInputs<'_>) -> StateKey {
    let enemy_pos = i.enemy.position();
    let mut key = [0; STATE_DIMS];
    key[..REDUCED_DIMS].copy_from_slice(&[
        bucket(i.bearing, BEARING_BUCKET),
        bucket(i.distance, DISTANCE_BUCKET),
        bucket(i.turret_bearing, BEARING_BUCKET),
        bucket(i.declination, DECLINATION_BUCKET),
        bucket(i.thrust, THRUST_BUCKET),
        bucket(i.steering, STEERING_BUCKET),
        bucket(i.me.x, DISTANCE_BUCKET),
        bucket(i.me.z, DISTANCE_BUCKET),
        bucket(i.me.bearing, BEARING_BUCKET),
        bucket(enemy_pos.x, DISTANCE_BUCKET),
        bucket(enemy_pos.y, DISTANCE_BUCKET),
    ]);
    StateKey(key)
}
