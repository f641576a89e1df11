use newwork_types::HEALTH_ENDPOINT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::*;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub path: String,
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
    pub failure_threshold: u32,
    pub startup_failure_threshold: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            path: HEALTH_ENDPOINT.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            startup_failure_threshold: DEFAULT_STARTUP_FAILURE_THRESHOLD,
        }
    }
}

impl HealthConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
