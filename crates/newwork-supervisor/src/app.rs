use newwork_types::NewworkResult;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SupervisorConfig;
use crate::recovery::{GracefulRestart, RecoveryCoordinator};
use crate::restart::{RestartOrchestrator, TracingHooks};
use crate::storage::StateStore;
use crate::supervisor::{BackendControl, ProcessSupervisor};

/// Composition root: owns every service and wires the recovery path from
/// the supervisor's health stream to the restart orchestrator.
pub struct SupervisorStack {
    config: SupervisorConfig,
    store: Arc<StateStore>,
    supervisor: Arc<ProcessSupervisor>,
    coordinator: Arc<RecoveryCoordinator>,
    orchestrator: Arc<RestartOrchestrator>,
    health_watch: Mutex<Option<JoinHandle<()>>>,
}

impl SupervisorStack {
    /// Opens the state store under the configured data directory.
    pub fn build(config: SupervisorConfig) -> NewworkResult<Self> {
        let store = StateStore::open(config.resolved_storage())?;
        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(config: SupervisorConfig, store: Arc<StateStore>) -> NewworkResult<Self> {
        let supervisor = Arc::new(ProcessSupervisor::from_config(&config)?);
        let backend: Arc<dyn BackendControl> = supervisor.clone();

        let orchestrator = Arc::new(
            RestartOrchestrator::new(backend.clone(), store.clone(), config.restart.clone())
                .with_hooks(Arc::new(TracingHooks)),
        );

        let coordinator = Arc::new(RecoveryCoordinator::new(
            backend,
            config.recovery.clone(),
            config.retry.clone(),
        ));
        let graceful: Arc<dyn GracefulRestart> = orchestrator.clone();
        coordinator.attach_orchestrator(graceful);

        debug!("Supervisor stack assembled for {}", supervisor.health_url());

        Ok(Self {
            config,
            store,
            supervisor,
            coordinator,
            orchestrator,
            health_watch: Mutex::new(None),
        })
    }

    /// Starts watching backend health, then launches the backend.
    pub async fn start(&self) -> NewworkResult<()> {
        {
            let mut watch = self.health_watch.lock();
            if watch.is_none() {
                *watch = Some(self.coordinator.spawn_health_watch());
            }
        }

        info!("Starting backend: {}", self.supervisor.health_url());
        self.supervisor.start().await
    }

    /// Abandons any restart in flight, stops the backend and flushes state.
    pub async fn shutdown(&self) -> NewworkResult<()> {
        if self.orchestrator.is_restarting() {
            warn!("Shutdown requested during a restart, abandoning it");
            self.orchestrator.force_stop().await;
        }

        if let Some(handle) = self.health_watch.lock().take() {
            handle.abort();
        }

        self.supervisor.stop().await?;
        self.store.flush_async().await?;

        info!("Supervisor stack stopped");
        Ok(())
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn supervisor(&self) -> &Arc<ProcessSupervisor> {
        &self.supervisor
    }

    pub fn coordinator(&self) -> &Arc<RecoveryCoordinator> {
        &self.coordinator
    }

    pub fn orchestrator(&self) -> &Arc<RestartOrchestrator> {
        &self.orchestrator
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, HealthConfig, RecoveryConfig, RestartConfig};
    use crate::recovery::RecoveryEvent;
    use crate::test_support::{wait_for_status, HealthResponder};
    use newwork_types::{ErrorCategory, ProcessStatus, RestartPhase, SavedAppState};
    use std::time::Duration;

    fn test_config(port: u16) -> SupervisorConfig {
        SupervisorConfig {
            backend: BackendConfig {
                program: "sh".into(),
                args: vec!["-c".into(), "exec sleep 60".into(), "newwork-backend".into()],
                port,
                stop_grace_ms: 2_000,
                ..Default::default()
            },
            health: HealthConfig {
                poll_interval_ms: 50,
                timeout_ms: 500,
                failure_threshold: 2,
                startup_failure_threshold: 3,
                ..Default::default()
            },
            restart: RestartConfig {
                phase_timeout_ms: 10_000,
                health_attempts: 50,
                health_interval_ms: 50,
            },
            recovery: RecoveryConfig {
                max_quick_restarts: 3,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn stack(port: u16) -> SupervisorStack {
        let store = Arc::new(StateStore::in_memory().expect("Failed to open store"));
        SupervisorStack::with_store(test_config(port), store).expect("Failed to build stack")
    }

    #[tokio::test]
    async fn test_crash_is_recovered_through_stack() {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let responder = HealthResponder::spawn().await;
        let stack = stack(responder.port());
        let mut health = stack.supervisor().subscribe();
        let mut events = stack.coordinator().subscribe();

        tokio_test::assert_ok!(stack.start().await);
        wait_for_status(&mut health, ProcessStatus::Running).await;
        let pid = stack.supervisor().pid().expect("No pid");

        kill(Pid::from_raw(pid as i32), Signal::SIGKILL).expect("Failed to kill child");

        let success = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match events.recv().await {
                    Ok(event @ RecoveryEvent::Success { .. }) => return event,
                    Ok(_) => continue,
                    Err(e) => panic!("recovery channel failed: {}", e),
                }
            }
        })
        .await
        .expect("Backend was not recovered");

        assert_eq!(success.error().category, ErrorCategory::Backend);
        loop {
            let running = wait_for_status(&mut health, ProcessStatus::Running).await;
            if running.pid != Some(pid) {
                break;
            }
        }
        assert_eq!(stack.coordinator().stats().recovered, 1);

        tokio_test::assert_ok!(stack.shutdown().await);
        assert_eq!(stack.supervisor().status(), ProcessStatus::Stopped);
    }

    #[tokio::test]
    async fn test_graceful_restart_through_stack() {
        let responder = HealthResponder::spawn().await;
        let stack = stack(responder.port());

        tokio_test::assert_ok!(stack.start().await);
        let state = SavedAppState::new().with_session("s-1");
        assert!(stack.orchestrator().perform_graceful_restart(Some(state)).await);
        assert_eq!(stack.orchestrator().phase(), RestartPhase::Completed);

        let saved = stack.store().load_app_state().expect("Failed to load");
        assert_eq!(saved.and_then(|s| s.active_session_id).as_deref(), Some("s-1"));
        assert_eq!(stack.coordinator().stats().errors_reported, 0);

        tokio_test::assert_ok!(stack.shutdown().await);
    }
}
