use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestartPhase {
    #[default]
    Idle,
    Prepare,
    Shutdown,
    Restart,
    Recover,
    Completed,
    Failed,
}

impl RestartPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RestartPhase::Completed | RestartPhase::Failed)
    }

    /// A run is in flight in every phase except idle and the terminal ones.
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            RestartPhase::Idle | RestartPhase::Completed | RestartPhase::Failed
        )
    }

    pub fn can_transition_to(&self, next: RestartPhase) -> bool {
        use RestartPhase::*;

        match (self, next) {
            (Idle | Completed | Failed, Prepare | Restart) => true,
            (Prepare, Shutdown) => true,
            (Shutdown, Restart) => true,
            (Restart, Recover | Completed) => true,
            (Recover, Completed) => true,
            (current, Failed) => current.is_active(),
            (_, Idle) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RestartPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartPhase::Idle => write!(f, "idle"),
            RestartPhase::Prepare => write!(f, "prepare"),
            RestartPhase::Shutdown => write!(f, "shutdown"),
            RestartPhase::Restart => write!(f, "restart"),
            RestartPhase::Recover => write!(f, "recover"),
            RestartPhase::Completed => write!(f, "completed"),
            RestartPhase::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartProgress {
    pub run_id: Uuid,
    pub phase: RestartPhase,
    pub progress: f64,
    pub message: String,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl RestartProgress {
    pub fn idle() -> Self {
        Self {
            run_id: Uuid::nil(),
            phase: RestartPhase::Idle,
            progress: 0.0,
            message: String::new(),
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn new(run_id: Uuid, phase: RestartPhase, progress: f64, message: impl Into<String>) -> Self {
        Self {
            run_id,
            phase,
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(run_id: Uuid, progress: f64, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            run_id,
            phase: RestartPhase::Failed,
            progress: progress.clamp(0.0, 1.0),
            message: "Restart failed".to_string(),
            error_message: Some(error),
            timestamp: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}
