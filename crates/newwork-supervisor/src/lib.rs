#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod config;
pub mod http_client;
pub mod recovery;
pub mod restart;
pub mod retry;
pub mod storage;
pub mod supervisor;

#[cfg(test)]
mod test_support;

pub use app::SupervisorStack;
pub use config::{
    BackendConfig, HealthConfig, LogLevel, LoggingConfig, RecoveryConfig, RestartConfig,
    RetryConfig, StorageConfig, SupervisorConfig,
};
pub use http_client::HealthClient;
pub use recovery::{
    classify, is_retryable_api_error, GracefulRestart, RecoveryAction, RecoveryCoordinator,
    RecoveryEvent, RecoveryOutcome, RecoveryStats,
};
pub use restart::{
    NoopHooks, NoopRefresher, PhaseMachine, ProviderRefresher, RestartHooks, RestartOrchestrator,
    RunTicket, TracingHooks,
};
pub use retry::{RetryExecutor, RetryLimiter, RetryPolicy};
pub use storage::{StateStore, StoreMetrics, StoreMetricsSnapshot};
pub use supervisor::{
    stop_signal, BackendControl, ProcessSupervisor, StopListener, StopSignal, SupervisorStats,
};
