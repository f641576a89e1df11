use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    #[default]
    Stopped,
    Starting,
    Running,
    Restarting,
    Unresponsive,
    Error,
}

impl ProcessStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProcessStatus::Running)
    }

    /// States the coordinator treats as a backend failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, ProcessStatus::Unresponsive | ProcessStatus::Error)
    }

    /// Whether a child process is expected to exist in this state.
    pub fn is_active(&self) -> bool {
        !matches!(self, ProcessStatus::Stopped)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Stopped => write!(f, "stopped"),
            ProcessStatus::Starting => write!(f, "starting"),
            ProcessStatus::Running => write!(f, "running"),
            ProcessStatus::Restarting => write!(f, "restarting"),
            ProcessStatus::Unresponsive => write!(f, "unresponsive"),
            ProcessStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessHealth {
    pub status: ProcessStatus,
    pub latency_ms: Option<u64>,
    pub consecutive_failures: u32,
    pub error_message: Option<String>,
    pub pid: Option<u32>,
    pub exit_code: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

impl Default for ProcessHealth {
    fn default() -> Self {
        Self::stopped()
    }
}

impl ProcessHealth {
    pub fn stopped() -> Self {
        Self::with_status(ProcessStatus::Stopped)
    }

    pub fn with_status(status: ProcessStatus) -> Self {
        Self {
            status,
            latency_ms: None,
            consecutive_failures: 0,
            error_message: None,
            pid: None,
            exit_code: None,
            timestamp: Utc::now(),
        }
    }

    /// Next value after a successful probe. Failures reset to zero.
    pub fn healthy(&self, latency_ms: u64) -> Self {
        Self {
            status: ProcessStatus::Running,
            latency_ms: Some(latency_ms),
            consecutive_failures: 0,
            error_message: None,
            pid: self.pid,
            exit_code: None,
            timestamp: Utc::now(),
        }
    }

    /// Next value after a failed probe. The status only changes to
    /// `unresponsive` once `threshold` consecutive failures are reached.
    pub fn probe_failed(&self, error: impl Into<String>, threshold: u32) -> Self {
        let consecutive_failures = self.consecutive_failures.saturating_add(1);
        let status = if consecutive_failures >= threshold {
            ProcessStatus::Unresponsive
        } else {
            self.status
        };

        Self {
            status,
            latency_ms: None,
            consecutive_failures,
            error_message: Some(error.into()),
            pid: self.pid,
            exit_code: None,
            timestamp: Utc::now(),
        }
    }

    pub fn exited(&self, exit_code: Option<i32>) -> Self {
        let message = match exit_code {
            Some(code) => format!("Backend exited with code {}", code),
            None => "Backend terminated by signal".to_string(),
        };

        Self {
            status: ProcessStatus::Error,
            latency_ms: None,
            consecutive_failures: self.consecutive_failures,
            error_message: Some(message),
            pid: None,
            exit_code,
            timestamp: Utc::now(),
        }
    }

    pub fn transition(&self, status: ProcessStatus) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
            ..self.clone()
        }
    }
}
