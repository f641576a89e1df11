//! Normalized error records shared by the whole recovery pipeline.
//!
//! Every failure the application cares about is classified into an
//! [`AppError`] at the point it happens. The category and, for API errors,
//! the HTTP status decide severity and recoverability once, here, and the
//! recovery coordinator only reads those two fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::NewworkError;

static NEXT_ERROR_ID: AtomicU64 = AtomicU64::new(1);

fn next_error_id() -> u64 {
    NEXT_ERROR_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Api,
    Backend,
    Render,
    Runtime,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Api => write!(f, "api"),
            ErrorCategory::Backend => write!(f, "backend"),
            ErrorCategory::Render => write!(f, "render"),
            ErrorCategory::Runtime => write!(f, "runtime"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "low"),
            ErrorSeverity::Medium => write!(f, "medium"),
            ErrorSeverity::High => write!(f, "high"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    pub id: u64,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub message: String,
    pub technical_details: Option<String>,
    pub retry_count: u32,
    pub is_recoverable: bool,
    pub status_code: Option<u16>,
    pub exit_code: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

impl AppError {
    fn new(
        category: ErrorCategory,
        severity: ErrorSeverity,
        message: impl Into<String>,
        is_recoverable: bool,
    ) -> Self {
        Self {
            id: next_error_id(),
            category,
            severity,
            message: message.into(),
            technical_details: None,
            retry_count: 0,
            is_recoverable,
            status_code: None,
            exit_code: None,
            timestamp: Utc::now(),
        }
    }

    /// Classifies a failed call against the backend HTTP API.
    ///
    /// 5xx is high severity, 408 is a low-severity timeout, other 4xx are
    /// medium. Only 5xx, 408 and status-less failures (connection errors)
    /// are worth retrying.
    pub fn from_api(message: impl Into<String>, status_code: Option<u16>) -> Self {
        let severity = match status_code {
            Some(code) if code >= 500 => ErrorSeverity::High,
            Some(408) => ErrorSeverity::Low,
            Some(code) if (400..500).contains(&code) => ErrorSeverity::Medium,
            _ => ErrorSeverity::Low,
        };
        let is_recoverable = match status_code {
            None => true,
            Some(code) => code >= 500 || code == 408,
        };

        let mut error = Self::new(ErrorCategory::Api, severity, message, is_recoverable);
        error.status_code = status_code;
        error
    }

    /// Backend failures are always high severity and always recoverable,
    /// since the supervisor can restart the process.
    pub fn from_backend(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        let mut error = Self::new(ErrorCategory::Backend, ErrorSeverity::High, message, true);
        error.exit_code = exit_code;
        if let Some(code) = exit_code {
            error.technical_details = Some(format!("exit code {}", code));
        }
        error
    }

    pub fn from_render(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Render, ErrorSeverity::Medium, message, true)
    }

    pub fn from_runtime(message: impl Into<String>, is_recoverable: bool) -> Self {
        let severity = if is_recoverable {
            ErrorSeverity::Medium
        } else {
            ErrorSeverity::Critical
        };
        Self::new(ErrorCategory::Runtime, severity, message, is_recoverable)
    }

    /// Classifies an internal error value.
    pub fn from_error(error: &NewworkError) -> Self {
        let classified = match error {
            NewworkError::Spawn(_) | NewworkError::Process(_) | NewworkError::HealthCheck(_) => {
                Self::from_backend(error.to_string(), None)
            }
            NewworkError::Http { status, message } => Self::from_api(message.clone(), Some(*status)),
            NewworkError::Network(_) => Self::from_api(error.to_string(), None),
            NewworkError::Timeout(_) => Self::from_api(error.to_string(), Some(408)),
            NewworkError::Config(_) => Self::from_runtime(error.to_string(), false),
            _ => Self::from_runtime(error.to_string(), true),
        };
        classified.with_details(format!("{:?}", error))
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.technical_details = Some(details.into());
        self
    }

    /// Returns a copy with the retry counter bumped. The id is kept so the
    /// copy still refers to the same failure.
    pub fn increment_retry(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity == ErrorSeverity::Critical
    }

    /// Whether the error has to reach the user regardless of recovery.
    pub fn must_surface(&self) -> bool {
        self.is_critical() || !self.is_recoverable
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.category, self.severity, self.message)
    }
}
