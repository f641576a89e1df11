use newwork_types::{AppError, NewworkError, NewworkResult, ProcessStatus};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::events::RecoveryEvent;
use super::policy::{classify, is_retryable_api_error, GracefulRestart, RecoveryAction, RecoveryOutcome};
use crate::config::{RecoveryConfig, RetryConfig};
use crate::retry::{RetryExecutor, RetryLimiter};
use crate::supervisor::BackendControl;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct RecoveryCounters {
    errors_reported: AtomicU64,
    surfaced: AtomicU64,
    quick_restarts: AtomicU64,
    escalations: AtomicU64,
    recovered: AtomicU64,
    failed: AtomicU64,
    rejected_in_progress: AtomicU64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryStats {
    pub errors_reported: u64,
    pub surfaced: u64,
    pub quick_restarts: u64,
    pub escalations: u64,
    pub recovered: u64,
    pub failed: u64,
    pub rejected_in_progress: u64,
}

/// Clears the single-recovery flag when dropped.
struct RecoveryGuard<'a>(&'a AtomicBool);

impl Drop for RecoveryGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Classifies reported errors and drives backend recovery.
pub struct RecoveryCoordinator {
    backend: Arc<dyn BackendControl>,
    config: RecoveryConfig,
    retry: RetryConfig,
    limiter: Mutex<RetryLimiter>,
    orchestrator: RwLock<Option<Arc<dyn GracefulRestart>>>,
    recovering: AtomicBool,
    history: Mutex<VecDeque<AppError>>,
    events: broadcast::Sender<RecoveryEvent>,
    counters: RecoveryCounters,
}

impl RecoveryCoordinator {
    pub fn new(backend: Arc<dyn BackendControl>, config: RecoveryConfig, retry: RetryConfig) -> Self {
        let limiter = RetryLimiter::new(config.max_quick_restarts, config.quick_restart_window());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let history = VecDeque::with_capacity(config.error_history.min(1024));

        Self {
            backend,
            config,
            retry,
            limiter: Mutex::new(limiter),
            orchestrator: RwLock::new(None),
            recovering: AtomicBool::new(false),
            history: Mutex::new(history),
            events,
            counters: RecoveryCounters::default(),
        }
    }

    pub fn attach_orchestrator(&self, orchestrator: Arc<dyn GracefulRestart>) {
        *self.orchestrator.write() = Some(orchestrator);
        debug!("Graceful restart attached to recovery coordinator");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecoveryEvent> {
        self.events.subscribe()
    }

    pub async fn report_error(&self, error: AppError) -> RecoveryOutcome {
        self.counters.errors_reported.fetch_add(1, Ordering::Relaxed);
        self.record(&error);
        self.emit(RecoveryEvent::Error { error: error.clone() });

        let action = classify(&error);
        debug!("Error #{} classified as {}", error.id, action);

        match action {
            RecoveryAction::Surface => {
                self.counters.surfaced.fetch_add(1, Ordering::Relaxed);
                warn!("Surfacing {}", error);
                RecoveryOutcome::Surfaced
            }
            RecoveryAction::RetryRequest => RecoveryOutcome::Observed,
            RecoveryAction::Notify => {
                info!("Non-fatal error: {}", error);
                RecoveryOutcome::Notified
            }
            RecoveryAction::QuickRestart | RecoveryAction::GracefulRestart => {
                self.recover_backend(error).await
            }
        }
    }

    async fn recover_backend(&self, error: AppError) -> RecoveryOutcome {
        if self.orchestrated_restart_running()
            || self
                .recovering
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
        {
            self.counters.rejected_in_progress.fetch_add(1, Ordering::Relaxed);
            debug!("Recovery already in progress, ignoring error #{}", error.id);
            return RecoveryOutcome::InProgress;
        }
        let _guard = RecoveryGuard(&self.recovering);

        let allowed = {
            let mut limiter = self.limiter.lock();
            if limiter.can_attempt() {
                limiter.record_attempt();
                true
            } else {
                false
            }
        };

        if !allowed {
            let wait = self.limiter.lock().wait_time();
            warn!(
                "Quick restart limit reached ({} per {:?}), next slot in {:?}",
                self.config.max_quick_restarts,
                self.config.quick_restart_window(),
                wait
            );

            let reason = "quick restart limit reached".to_string();
            if self.config.escalate_on_limit {
                if let Some(outcome) = self.escalate(&error).await {
                    return outcome;
                }
            }
            self.counters.surfaced.fetch_add(1, Ordering::Relaxed);
            self.emit(RecoveryEvent::Failed { error, reason });
            return RecoveryOutcome::Surfaced;
        }

        self.counters.quick_restarts.fetch_add(1, Ordering::Relaxed);
        self.emit(RecoveryEvent::Attempt {
            error: error.clone(),
            action: RecoveryAction::QuickRestart,
        });

        match self.quick_restart().await {
            Ok(()) => {
                self.counters.recovered.fetch_add(1, Ordering::Relaxed);
                info!("Backend recovered by quick restart");
                self.emit(RecoveryEvent::Success {
                    error,
                    action: RecoveryAction::QuickRestart,
                });
                RecoveryOutcome::Recovered
            }
            Err(e) => {
                warn!("Quick restart failed: {}", e);
                if self.config.escalate_on_quick_failure {
                    if let Some(outcome) = self.escalate(&error).await {
                        return outcome;
                    }
                }
                let reason = format!("quick restart failed: {}", e);
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                self.emit(RecoveryEvent::Failed {
                    error,
                    reason: reason.clone(),
                });
                RecoveryOutcome::Failed(reason)
            }
        }
    }

    async fn quick_restart(&self) -> NewworkResult<()> {
        self.backend.restart_backend().await?;

        let backend = &self.backend;
        RetryExecutor::new(self.retry.health_check)
            .with_label("backend health")
            .execute(|| async move {
                if backend.check_health().await {
                    Ok(())
                } else {
                    Err(NewworkError::HealthCheck(
                        "backend not healthy after restart".into(),
                    ))
                }
            })
            .await
    }

    /// `None` when no graceful restart is attached.
    async fn escalate(&self, error: &AppError) -> Option<RecoveryOutcome> {
        let orchestrator = self.orchestrator.read().clone()?;

        self.counters.escalations.fetch_add(1, Ordering::Relaxed);
        info!("Escalating error #{} to a graceful restart", error.id);
        self.emit(RecoveryEvent::Attempt {
            error: error.clone(),
            action: RecoveryAction::GracefulRestart,
        });

        if orchestrator.perform_graceful_restart(None).await {
            self.counters.recovered.fetch_add(1, Ordering::Relaxed);
            self.emit(RecoveryEvent::Success {
                error: error.clone(),
                action: RecoveryAction::GracefulRestart,
            });
            Some(RecoveryOutcome::Escalated)
        } else {
            let reason = "graceful restart failed".to_string();
            error!("Recovery of error #{} failed: {}", error.id, reason);
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            self.emit(RecoveryEvent::Failed {
                error: error.clone(),
                reason: reason.clone(),
            });
            Some(RecoveryOutcome::Failed(reason))
        }
    }

    /// Reports backend failures observed by the supervisor's poll loop.
    /// Only transitions into `error`/`unresponsive` count.
    pub fn spawn_health_watch(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        let mut rx = coordinator.backend.subscribe();
        let mut previous = coordinator.backend.health().status;

        tokio::spawn(async move {
            loop {
                let health = match rx.recv().await {
                    Ok(health) => health,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Health watch lagged, skipped {} updates", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                let entered_failure = health.status.is_failure() && !previous.is_failure();
                previous = health.status;

                if !entered_failure {
                    continue;
                }

                if coordinator.orchestrated_restart_running() {
                    debug!("Ignoring {} during orchestrated restart", health.status);
                    continue;
                }

                let message = match health.status {
                    ProcessStatus::Unresponsive => "Backend stopped responding to health checks",
                    _ => "Backend process exited",
                };
                let mut error = AppError::from_backend(message, health.exit_code);
                if let Some(details) = health.error_message {
                    error = error.with_details(details);
                }

                let outcome = coordinator.report_error(error).await;
                debug!("Health watch recovery outcome: {:?}", outcome);
            }

            debug!("Health watch stopped");
        })
    }

    /// Executor for API call sites, retrying only transient failures.
    pub fn api_executor(&self) -> RetryExecutor {
        RetryExecutor::new(self.retry.api).with_label("api request")
    }

    pub fn should_retry_api(&self, error: &NewworkError) -> bool {
        is_retryable_api_error(error)
    }

    pub fn is_recovering(&self) -> bool {
        self.recovering.load(Ordering::SeqCst)
    }

    pub fn recent_errors(&self) -> Vec<AppError> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn clear_errors(&self) {
        self.history.lock().clear();
    }

    pub fn quick_restarts_in_window(&self) -> usize {
        self.limiter.lock().attempts_in_window()
    }

    pub fn stats(&self) -> RecoveryStats {
        let c = &self.counters;
        RecoveryStats {
            errors_reported: c.errors_reported.load(Ordering::Relaxed),
            surfaced: c.surfaced.load(Ordering::Relaxed),
            quick_restarts: c.quick_restarts.load(Ordering::Relaxed),
            escalations: c.escalations.load(Ordering::Relaxed),
            recovered: c.recovered.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            rejected_in_progress: c.rejected_in_progress.load(Ordering::Relaxed),
        }
    }

    fn orchestrated_restart_running(&self) -> bool {
        self.orchestrator
            .read()
            .as_ref()
            .map(|o| o.is_restarting())
            .unwrap_or(false)
    }

    fn record(&self, error: &AppError) {
        if self.config.error_history == 0 {
            return;
        }
        let mut history = self.history.lock();
        while history.len() >= self.config.error_history {
            history.pop_front();
        }
        history.push_back(error.clone());
    }

    fn emit(&self, event: RecoveryEvent) {
        let _ = self.events.send(event);
    }
}
