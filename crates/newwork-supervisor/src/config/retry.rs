use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub api: RetryPolicy,
    pub backend_restart: RetryPolicy,
    pub health_check: RetryPolicy,
    pub reconnect: RetryPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            api: RetryPolicy::API,
            backend_restart: RetryPolicy::BACKEND_RESTART,
            health_check: RetryPolicy::HEALTH_CHECK,
            reconnect: RetryPolicy::RECONNECT,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, policy) in [
            ("api", &self.api),
            ("backend_restart", &self.backend_restart),
            ("health_check", &self.health_check),
            ("reconnect", &self.reconnect),
        ] {
            policy
                .validate()
                .map_err(|e| format!("retry.{}: {}", name, e))?;
        }
        Ok(())
    }
}
