use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::*;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartConfig {
    pub phase_timeout_ms: u64,
    pub health_attempts: u32,
    pub health_interval_ms: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            phase_timeout_ms: DEFAULT_PHASE_TIMEOUT_MS,
            health_attempts: DEFAULT_RESTART_HEALTH_ATTEMPTS,
            health_interval_ms: DEFAULT_RESTART_HEALTH_INTERVAL_MS,
        }
    }
}

impl RestartConfig {
    pub fn phase_timeout(&self) -> Duration {
        Duration::from_millis(self.phase_timeout_ms)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }
}
