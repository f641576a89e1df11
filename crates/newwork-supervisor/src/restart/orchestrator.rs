use async_trait::async_trait;
use newwork_types::{NewworkError, NewworkResult, RestartPhase, RestartProgress, SavedAppState};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::hooks::{NoopHooks, NoopRefresher, ProviderRefresher, RestartHooks};
use super::phase::{PhaseMachine, RunTicket};
use crate::config::RestartConfig;
use crate::recovery::GracefulRestart;
use crate::storage::StateStore;
use crate::supervisor::{stop_signal, BackendControl, StopListener, StopSignal};

const PREPARE_PROGRESS: f64 = 0.1;
const SHUTDOWN_PROGRESS: f64 = 0.3;
const RESTART_PROGRESS: f64 = 0.6;
const HEALTHY_PROGRESS: f64 = 0.7;
const RECOVER_PROGRESS: f64 = 0.9;
const QUICK_RESTART_PROGRESS: f64 = 0.5;

/// Runs the prepare/shutdown/restart/recover protocol, one run at a time.
pub struct RestartOrchestrator {
    backend: Arc<dyn BackendControl>,
    store: Arc<StateStore>,
    hooks: Arc<dyn RestartHooks>,
    refresher: Arc<dyn ProviderRefresher>,
    config: RestartConfig,
    machine: PhaseMachine,
    abort: Mutex<Option<(Uuid, StopSignal)>>,
}

impl RestartOrchestrator {
    pub fn new(backend: Arc<dyn BackendControl>, store: Arc<StateStore>, config: RestartConfig) -> Self {
        Self {
            backend,
            store,
            hooks: Arc::new(NoopHooks),
            refresher: Arc::new(NoopRefresher),
            config,
            machine: PhaseMachine::new(),
            abort: Mutex::new(None),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn RestartHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn ProviderRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    /// Returns `true` only if the run reached `completed`. A call made while
    /// another run is in flight is rejected with `false` and leaves that run
    /// untouched.
    pub async fn perform_graceful_restart(&self, state: Option<SavedAppState>) -> bool {
        let ticket = match self
            .machine
            .begin(RestartPhase::Prepare, PREPARE_PROGRESS, "Preparing restart")
        {
            Some(ticket) => ticket,
            None => {
                warn!("Graceful restart rejected: a restart is already in progress");
                return false;
            }
        };

        info!("Graceful restart {} started", ticket.run_id);
        let mut listener = self.arm(&ticket);
        let result = self.run_graceful(&ticket, state, &mut listener).await;
        self.finish(&ticket, result).await
    }

    /// `restart_backend` plus a health wait, without saving or restoring state.
    pub async fn quick_restart_backend(&self) -> bool {
        let ticket = match self.machine.begin(
            RestartPhase::Restart,
            QUICK_RESTART_PROGRESS,
            "Restarting backend",
        ) {
            Some(ticket) => ticket,
            None => {
                warn!("Quick restart rejected: a restart is already in progress");
                return false;
            }
        };

        let mut listener = self.arm(&ticket);
        let result = self
            .run_phase(RestartPhase::Restart, &mut listener, async {
                self.backend.restart_backend().await?;
                self.wait_for_health().await
            })
            .await;
        self.finish(&ticket, result).await
    }

    /// Abandons any in-flight run and returns to idle. The abandoned run gets
    /// exactly one `failed` event.
    pub async fn force_stop(&self) -> bool {
        let reason = "Restart force-stopped";
        let abandoned = self.machine.force_idle(reason);

        if let Some((_, signal)) = self.abort.lock().take() {
            signal.trigger();
        }

        match abandoned {
            Some(run_id) => {
                warn!("Restart {} force-stopped", run_id);
                self.hooks.on_failed(reason).await;
                true
            }
            None => false,
        }
    }

    pub fn load_saved_state(&self) -> NewworkResult<Option<SavedAppState>> {
        self.store.load_app_state()
    }

    pub fn clear_saved_state(&self) -> NewworkResult<bool> {
        self.store.clear_app_state()
    }

    pub fn phase(&self) -> RestartPhase {
        self.machine.phase()
    }

    pub fn progress(&self) -> RestartProgress {
        self.machine.progress()
    }

    pub fn is_restarting(&self) -> bool {
        self.machine.is_active()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RestartProgress> {
        self.machine.subscribe()
    }

    async fn run_graceful(
        &self,
        ticket: &RunTicket,
        state: Option<SavedAppState>,
        listener: &mut StopListener,
    ) -> NewworkResult<()> {
        self.run_phase(RestartPhase::Prepare, listener, async {
            self.hooks.on_prepare().await?;
            if let Some(state) = state {
                self.store.save_app_state(&state.touch())?;
                debug!("Application state saved");
            }
            Ok(())
        })
        .await?;

        self.advance(ticket, RestartPhase::Shutdown, SHUTDOWN_PROGRESS, "Stopping backend")?;
        self.run_phase(RestartPhase::Shutdown, listener, async {
            self.hooks.on_shutdown().await?;
            self.backend.stop().await
        })
        .await?;

        self.advance(ticket, RestartPhase::Restart, RESTART_PROGRESS, "Starting backend")?;
        self.run_phase(RestartPhase::Restart, listener, async {
            self.hooks.on_restart().await?;
            self.backend.start().await?;
            self.wait_for_health().await
        })
        .await?;
        self.machine.report(ticket, HEALTHY_PROGRESS, "Backend healthy");

        self.advance(
            ticket,
            RestartPhase::Recover,
            RECOVER_PROGRESS,
            "Restoring application state",
        )?;
        self.run_phase(RestartPhase::Recover, listener, async {
            self.hooks.on_recover().await?;
            self.refresher.refresh_providers().await
        })
        .await
    }

    /// Runs one phase body under the phase timeout. Abandonment via
    /// `force_stop` wins over the body.
    async fn run_phase<F>(
        &self,
        phase: RestartPhase,
        listener: &mut StopListener,
        body: F,
    ) -> NewworkResult<()>
    where
        F: Future<Output = NewworkResult<()>>,
    {
        let limit = self.config.phase_timeout();

        tokio::select! {
            _ = listener.triggered() => Err(NewworkError::Aborted(format!("{} phase abandoned", phase))),
            result = tokio::time::timeout(limit, body) => match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(NewworkError::Recovery(format!("{} phase failed: {}", phase, e))),
                Err(_) => Err(NewworkError::Timeout(format!(
                    "{} phase did not finish within {:?}",
                    phase, limit
                ))),
            },
        }
    }

    async fn wait_for_health(&self) -> NewworkResult<()> {
        let attempts = self.config.health_attempts.max(1);

        for attempt in 1..=attempts {
            if self.backend.check_health().await {
                debug!("Backend healthy after {} check(s)", attempt);
                return Ok(());
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.health_interval()).await;
            }
        }

        Err(NewworkError::HealthCheck(format!(
            "backend not healthy after {} checks",
            attempts
        )))
    }

    fn advance(&self, ticket: &RunTicket, phase: RestartPhase, progress: f64, message: &str) -> NewworkResult<()> {
        if self.machine.advance(ticket, phase, progress, message) {
            Ok(())
        } else {
            Err(NewworkError::Aborted(format!("run {} no longer current", ticket.run_id)))
        }
    }

    fn arm(&self, ticket: &RunTicket) -> StopListener {
        let (signal, listener) = stop_signal();
        *self.abort.lock() = Some((ticket.run_id, signal));
        listener
    }

    fn disarm(&self, ticket: &RunTicket) {
        let mut abort = self.abort.lock();
        if matches!(abort.as_ref(), Some((run_id, _)) if *run_id == ticket.run_id) {
            *abort = None;
        }
    }

    async fn finish(&self, ticket: &RunTicket, result: NewworkResult<()>) -> bool {
        self.disarm(ticket);

        match result {
            Ok(()) => {
                if self.machine.complete(ticket, "Restart completed") {
                    info!("Restart {} completed", ticket.run_id);
                    self.hooks.on_complete().await;
                    true
                } else {
                    false
                }
            }
            Err(e) => {
                let reason = e.to_string();
                if self.machine.fail(ticket, &reason) {
                    error!("Restart {} failed: {}", ticket.run_id, reason);
                    self.hooks.on_failed(&reason).await;
                } else {
                    debug!("Restart {} ended after being abandoned: {}", ticket.run_id, reason);
                }
                false
            }
        }
    }
}

#[async_trait]
impl GracefulRestart for RestartOrchestrator {
    fn is_restarting(&self) -> bool {
        RestartOrchestrator::is_restarting(self)
    }

    async fn perform_graceful_restart(&self, state: Option<SavedAppState>) -> bool {
        RestartOrchestrator::perform_graceful_restart(self, state).await
    }
}
