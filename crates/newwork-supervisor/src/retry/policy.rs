use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const JITTER_FACTOR: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub use_jitter: bool,
    pub multiplier: f64,
}

impl RetryPolicy {
    pub const API: RetryPolicy = RetryPolicy {
        max_retries: 3,
        base_delay_ms: 1_000,
        max_delay_ms: 10_000,
        use_jitter: true,
        multiplier: 2.0,
    };

    pub const BACKEND_RESTART: RetryPolicy = RetryPolicy {
        max_retries: 3,
        base_delay_ms: 2_000,
        max_delay_ms: 30_000,
        use_jitter: false,
        multiplier: 1.5,
    };

    pub const HEALTH_CHECK: RetryPolicy = RetryPolicy {
        max_retries: 5,
        base_delay_ms: 500,
        max_delay_ms: 5_000,
        use_jitter: false,
        multiplier: 2.0,
    };

    pub const RECONNECT: RetryPolicy = RetryPolicy {
        max_retries: 10,
        base_delay_ms: 1_000,
        max_delay_ms: 60_000,
        use_jitter: true,
        multiplier: 1.5,
    };

    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay_ms: base_delay.as_millis() as u64,
            max_delay_ms: max_delay.as_millis() as u64,
            use_jitter: false,
            multiplier: 2.0,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, enabled: bool) -> Self {
        self.use_jitter = enabled;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn get_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self.base_delay_for(attempt);

        let final_ms = if self.use_jitter && delay_ms > 0.0 {
            delay_ms + rand::thread_rng().gen_range(0.0..delay_ms * JITTER_FACTOR)
        } else {
            delay_ms
        };

        Duration::from_micros((final_ms * 1000.0).round() as u64)
    }

    /// The exponential delay in milliseconds, before jitter.
    pub fn base_delay_for(&self, attempt: u32) -> f64 {
        let base = self.base_delay_ms as f64;
        if attempt == 0 {
            return base;
        }

        let max = self.max_delay_ms as f64;
        let exponent = (attempt - 1).min(i32::MAX as u32) as i32;
        let exponential = base * self.multiplier.powi(exponent);

        if exponential.is_finite() {
            exponential.min(max).max(base)
        } else {
            max.max(base)
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_delay_ms > self.max_delay_ms {
            return Err(format!(
                "base delay {}ms exceeds max delay {}ms",
                self.base_delay_ms, self.max_delay_ms
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(format!("multiplier must be >= 1.0, got {}", self.multiplier));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::API
    }
}
