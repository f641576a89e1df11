use async_trait::async_trait;
use newwork_types::{AppError, ErrorCategory, NewworkError, SavedAppState};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    QuickRestart,
    GracefulRestart,
    RetryRequest,
    Notify,
    Surface,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryAction::QuickRestart => write!(f, "quick restart"),
            RecoveryAction::GracefulRestart => write!(f, "graceful restart"),
            RecoveryAction::RetryRequest => write!(f, "retry request"),
            RecoveryAction::Notify => write!(f, "notify"),
            RecoveryAction::Surface => write!(f, "surface"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum RecoveryOutcome {
    /// Shown to the user; no automatic recovery.
    Surfaced,
    /// Left to the call site's retry loop.
    Observed,
    /// User-visible but non-fatal.
    Notified,
    /// A quick restart brought the backend back.
    Recovered,
    /// A graceful restart brought the backend back.
    Escalated,
    Failed(String),
    /// Another recovery already owns the backend.
    InProgress,
}

impl RecoveryOutcome {
    pub fn is_recovered(&self) -> bool {
        matches!(self, RecoveryOutcome::Recovered | RecoveryOutcome::Escalated)
    }
}

/// Decides how an error is handled. Critical or unrecoverable errors are
/// always surfaced, whatever their category.
pub fn classify(error: &AppError) -> RecoveryAction {
    if error.must_surface() {
        return RecoveryAction::Surface;
    }

    match error.category {
        ErrorCategory::Backend => RecoveryAction::QuickRestart,
        ErrorCategory::Api => RecoveryAction::RetryRequest,
        ErrorCategory::Render | ErrorCategory::Runtime => RecoveryAction::Notify,
    }
}

/// Retry predicate for API calls: server errors, 408, timeouts and
/// transport failures.
pub fn is_retryable_api_error(error: &NewworkError) -> bool {
    match error {
        NewworkError::Http { status, .. } => *status >= 500 || *status == 408,
        NewworkError::Network(_) | NewworkError::Timeout(_) => true,
        _ => false,
    }
}

/// Full save/stop/start/restore cycle the coordinator escalates to.
#[async_trait]
pub trait GracefulRestart: Send + Sync {
    fn is_restarting(&self) -> bool;

    async fn perform_graceful_restart(&self, state: Option<SavedAppState>) -> bool;
}
