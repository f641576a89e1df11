use newwork_types::AppError;
use serde::Serialize;
use std::fmt;

use super::policy::RecoveryAction;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecoveryEvent {
    Error {
        error: AppError,
    },
    Attempt {
        error: AppError,
        action: RecoveryAction,
    },
    Success {
        error: AppError,
        action: RecoveryAction,
    },
    Failed {
        error: AppError,
        reason: String,
    },
}

impl RecoveryEvent {
    pub fn error(&self) -> &AppError {
        match self {
            RecoveryEvent::Error { error }
            | RecoveryEvent::Attempt { error, .. }
            | RecoveryEvent::Success { error, .. }
            | RecoveryEvent::Failed { error, .. } => error,
        }
    }
}

impl fmt::Display for RecoveryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryEvent::Error { error } => write!(f, "error {}", error),
            RecoveryEvent::Attempt { error, action } => {
                write!(f, "attempting {} for error #{}", action, error.id)
            }
            RecoveryEvent::Success { error, action } => {
                write!(f, "{} recovered error #{}", action, error.id)
            }
            RecoveryEvent::Failed { error, reason } => {
                write!(f, "recovery of error #{} failed: {}", error.id, reason)
            }
        }
    }
}
