#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod app_error;
mod error;
mod health;
mod restart;
mod state;

pub use app_error::{AppError, ErrorCategory, ErrorSeverity};
pub use error::{NewworkError, NewworkResult};
pub use health::{ProcessHealth, ProcessStatus};
pub use restart::{RestartPhase, RestartProgress};
pub use state::SavedAppState;

pub const DEFAULT_BACKEND_HOST: &str = "127.0.0.1";

pub const DEFAULT_BACKEND_PORT: u16 = 8000;

pub const HEALTH_ENDPOINT: &str = "/health";

pub const APP_STATE_KEY: &str = "newwork.app_state";
