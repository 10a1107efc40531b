// Wire format
pub const TELEMETRY_LEN: usize = 84;
pub const COMMAND_LEN: usize = 76;
pub const TELEMETRY_FLOAT_CHANNELS: usize = 16;
pub const RESERVED_CHANNELS: usize = 3;

// Command codes
pub const CMD_NORMAL: i32 = 0;
pub const CMD_FIRE: i32 = 11;
pub const CMD_RESET: i32 = 13;
pub const DEFAULT_FACTION: i32 = 1;

// Network (participant 1 / participant 2)
pub const TELEMETRY_PORTS: [u16; 2] = [4601, 4602];
pub const COMMAND_PORTS: [u16; 2] = [4501, 4502];
pub const SIMULATOR_HOST: &str = "127.0.0.1";
pub const BIND_HOST: &str = "0.0.0.0";
pub const RECV_TIMEOUT_SECS: u64 = 5;

// Participants
pub const PARTICIPANT_ONE: i32 = 1;
pub const PARTICIPANT_TWO: i32 = 2;

// Bucket widths for state discretization
pub const BEARING_BUCKET: f32 = 36.0;
pub const DISTANCE_BUCKET: f32 = 100.0;
pub const DECLINATION_BUCKET: f32 = 10.0;
pub const THRUST_BUCKET: f32 = 3.33;
pub const STEERING_BUCKET: f32 = 3.0;
pub const BUCKET_EPSILON: f64 = 1e-9;
pub const STATE_DIMS: usize = 14;

// Driving
pub const MAX_STEERING: f32 = 15.0;
pub const FULL_THRUST: f32 = 10.0;
pub const TURN_THRUST: f32 = 3.0;
pub const APPROACH_DISTANCE: f32 = 300.0; // approach while farther than this
pub const ORBIT_DISTANCE: f32 = 100.0; // orbit while closer than this
pub const CRUISE_RADIUS: f32 = 1700.0;

// Action space
pub const DECLINATION_LEVELS: usize = 6;
pub const DECLINATION_MAX: f32 = 2.5;
pub const CORRECTION_LEVELS: usize = 11;
pub const CORRECTION_SPAN: f32 = 2.5;

// Learning
pub const LEARNING_RATE: f64 = 0.1;
pub const DISCOUNT_FACTOR: f64 = 0.2;
pub const EPSILON: f64 = 0.02;

// Delayed rewards
pub const SHOT_DELAY_TICKS: i32 = 150;
pub const HIT_REWARD_SCALE: f64 = 20.0;
pub const MISS_PENALTY: f64 = -50.0;
pub const DESTROY_BONUS: f64 = 5000.0;

// Heuristic firing: fire again once the bearing to the enemy moved this far (degrees)
pub const FIRE_ANGLE_THRESHOLD: f32 = 1.0;

// Episode termination
pub const DESTROYED_HEALTH: f32 = 50.0;
pub const TIME_LIMIT_TICKS: u64 = 4900;
pub const MIN_POWER: f32 = 10.0;

// Persistence
pub const DEFAULT_Q_TABLE_PATH: &str = "q_table.json";
pub const DEFAULT_RECORD_DIR: &str = "./data";
