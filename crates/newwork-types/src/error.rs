use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewworkError {
    #[error("Failed to spawn backend: {0}")]
    Spawn(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Health check failed: {0}")]
    HealthCheck(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("A restart is already in progress")]
    RestartInProgress,

    #[error("Restart aborted: {0}")]
    Aborted(String),

    #[error("Recovery error: {0}")]
    Recovery(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NewworkError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NewworkError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, NewworkError::Timeout(_))
    }
}

pub type NewworkResult<T> = Result<T, NewworkError>;
