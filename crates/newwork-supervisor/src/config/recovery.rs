use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::*;

/// When the coordinator gives up on quick restarts and escalates to a full
/// graceful restart.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub max_quick_restarts: usize,
    pub quick_restart_window_secs: u64,
    pub escalate_on_limit: bool,
    pub escalate_on_quick_failure: bool,
    pub error_history: usize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_quick_restarts: DEFAULT_MAX_QUICK_RESTARTS,
            quick_restart_window_secs: DEFAULT_QUICK_RESTART_WINDOW_SECS,
            escalate_on_limit: true,
            escalate_on_quick_failure: true,
            error_history: DEFAULT_ERROR_HISTORY,
        }
    }
}

impl RecoveryConfig {
    pub fn quick_restart_window(&self) -> Duration {
        Duration::from_secs(self.quick_restart_window_secs)
    }
}
