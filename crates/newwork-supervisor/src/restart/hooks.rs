use async_trait::async_trait;
use newwork_types::NewworkResult;
use tracing::{info, warn};

/// Callbacks run at the start of each restart phase. A hook error fails the
/// phase it belongs to.
#[async_trait]
pub trait RestartHooks: Send + Sync {
    async fn on_prepare(&self) -> NewworkResult<()> {
        Ok(())
    }

    async fn on_shutdown(&self) -> NewworkResult<()> {
        Ok(())
    }

    async fn on_restart(&self) -> NewworkResult<()> {
        Ok(())
    }

    async fn on_recover(&self) -> NewworkResult<()> {
        Ok(())
    }

    async fn on_complete(&self) {}

    async fn on_failed(&self, _reason: &str) {}
}

/// Reloads state that depends on the backend once it is healthy again.
#[async_trait]
pub trait ProviderRefresher: Send + Sync {
    async fn refresh_providers(&self) -> NewworkResult<()>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl RestartHooks for NoopHooks {}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopRefresher;

#[async_trait]
impl ProviderRefresher for NoopRefresher {
    async fn refresh_providers(&self) -> NewworkResult<()> {
        Ok(())
    }
}

/// Logs phase boundaries. Used by the CLI.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingHooks;

#[async_trait]
impl RestartHooks for TracingHooks {
    async fn on_prepare(&self) -> NewworkResult<()> {
        info!("Graceful restart: saving application state");
        Ok(())
    }

    async fn on_shutdown(&self) -> NewworkResult<()> {
        info!("Graceful restart: stopping backend");
        Ok(())
    }

    async fn on_restart(&self) -> NewworkResult<()> {
        info!("Graceful restart: starting backend");
        Ok(())
    }

    async fn on_recover(&self) -> NewworkResult<()> {
        info!("Graceful restart: refreshing providers");
        Ok(())
    }

    async fn on_complete(&self) {
        info!("Graceful restart completed");
    }

    async fn on_failed(&self, reason: &str) {
        warn!("Graceful restart failed: {}", reason);
    }
}
