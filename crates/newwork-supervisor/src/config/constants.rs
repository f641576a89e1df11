pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_STARTUP_FAILURE_THRESHOLD: u32 = 30;
pub const DEFAULT_STOP_GRACE_MS: u64 = 5_000;

pub const DEFAULT_MAX_QUICK_RESTARTS: usize = 3;
pub const DEFAULT_QUICK_RESTART_WINDOW_SECS: u64 = 300;
pub const DEFAULT_ERROR_HISTORY: usize = 100;

pub const DEFAULT_PHASE_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RESTART_HEALTH_ATTEMPTS: u32 = 10;
pub const DEFAULT_RESTART_HEALTH_INTERVAL_MS: u64 = 500;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATE_DB_DIR: &str = "state";

pub const DEFAULT_CACHE_CAPACITY_BYTES: u64 = 8 * 1024 * 1024;
pub const DEFAULT_FLUSH_EVERY_MS: u64 = 1_000;
