mod coordinator;
mod events;
mod policy;

pub use coordinator::{RecoveryCoordinator, RecoveryStats};
pub use events::RecoveryEvent;
pub use policy::{classify, is_retryable_api_error, GracefulRestart, RecoveryAction, RecoveryOutcome};
