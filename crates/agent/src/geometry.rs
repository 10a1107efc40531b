use duel_shared::*;

/// Steering decision plus the bearing it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub thrust: f32,
    pub steering: f32,
    /// Bearing to the enemy in the simulator's frame, degrees.
    pub bearing: f32,
}

/// Wrap degrees into [0, 360).
pub fn normalize_degrees(deg: f32) -> f32 {
    let r = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// Wrap degrees into (-180, 180].
pub fn signed_degrees(deg: f32) -> f32 {
    let r = normalize_degrees(deg);
    if r > 180.0 {
        r - 360.0
    } else {
        r
    }
}

/// Rotation from the planar atan2 angle into the simulator's bearing frame.
pub const FRAME_OFFSET: f32 = 90.0;

/// Bearing from `me` to `enemy`, rotated +90° into the simulator's reference frame.
/// Always in [0, 360).
pub fn bearing_to(me: &TelemetryFrame, enemy: &TelemetryFrame) -> f32 {
    offset_bearing(me, enemy, FRAME_OFFSET)
}

/// Planar angle from `me` to `enemy` rotated by `offset` degrees, in [0, 360).
pub fn offset_bearing(me: &TelemetryFrame, enemy: &TelemetryFrame, offset: f32) -> f32 {
    let d = enemy.position() - me.position();
    let raw = normalize_degrees(d.y.atan2(d.x).to_degrees());
    normalize_degrees(raw + offset)
}

/// Planar (x, z) distance.
pub fn distance(me: &TelemetryFrame, enemy: &TelemetryFrame) -> f32 {
    me.position().distance(enemy.position())
}

/// Turret bearing that points straight at the enemy given the current hull bearing.
/// Not wrapped into any range; the simulator receives the raw value.
pub fn turret_lock_bearing(me: &TelemetryFrame, enemy: &TelemetryFrame) -> f32 {
    bearing_to(me, enemy) - me.bearing + 180.0
}

/// Slow down in sharp turns.
pub fn thrust_for(steering: f32) -> f32 {
    if steering.abs() >= MAX_STEERING {
        TURN_THRUST
    } else {
        FULL_THRUST
    }
}

/// Close in on the enemy.
pub fn approach_steering(me: &TelemetryFrame, enemy: &TelemetryFrame) -> Steering {
    approach_steering_offset(me, enemy, FRAME_OFFSET)
}

/// Approach steering computed from the bearing rotated by `offset` instead of the
/// frame rotation. Any offset other than 90° drives at an angle to the enemy.
pub fn approach_steering_offset(me: &TelemetryFrame, enemy: &TelemetryFrame, offset: f32) -> Steering {
    let bearing = offset_bearing(me, enemy, offset);
    let raw = if bearing > 180.0 {
        bearing - me.bearing - 180.0
    } else {
        bearing - me.bearing + 180.0
    };
    let steering = raw.clamp(-MAX_STEERING, MAX_STEERING);
    Steering {
        thrust: thrust_for(steering),
        steering,
        bearing,
    }
}

/// Circle the enemy by holding a heading tangential to the line of sight.
pub fn orbit_steering(me: &TelemetryFrame, enemy: &TelemetryFrame) -> Steering {
    let bearing = bearing_to(me, enemy);
    let circle_bearing = normalize_degrees(bearing + 90.0);
    let steering = signed_degrees(circle_bearing - me.bearing);
    Steering {
        thrust: thrust_for(steering),
        steering,
        bearing,
    }
}
