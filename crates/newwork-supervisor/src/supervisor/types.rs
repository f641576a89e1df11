use async_trait::async_trait;
use newwork_types::{NewworkResult, ProcessHealth};
use std::time::Duration;
use tokio::sync::broadcast;

pub const HEALTH_CHANNEL_CAPACITY: usize = 64;
pub const BACKEND_LOG_TARGET: &str = "newwork::backend";
pub const MONITOR_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Lifecycle control over the backend child process.
#[async_trait]
pub trait BackendControl: Send + Sync {
    async fn start(&self) -> NewworkResult<()>;

    async fn stop(&self) -> NewworkResult<()>;

    async fn restart_backend(&self) -> NewworkResult<()>;

    /// One on-demand probe, independent of the poll loop.
    async fn check_health(&self) -> bool;

    fn health(&self) -> ProcessHealth;

    fn subscribe(&self) -> broadcast::Receiver<ProcessHealth>;
}
