pub const ELEVATOR_ID: &str = "car-1";
pub const GROUND_FLOOR: i64 = 0;

pub const LISTEN_ADDR: &str = "127.0.0.1:8000";
pub const LISTEN_BACKLOG: i32 = 128;

pub const MIN_FLOOR: i64 = 0;
pub const MAX_FLOOR: i64 = 10;
pub const MAX_STEPS_PER_CALL: i64 = 1000;
pub const MAX_AUTO_STEP_MS: u64 = 3_600_000;
