use async_trait::async_trait;
use newwork_types::{NewworkError, NewworkResult, ProcessHealth, ProcessStatus};
use parking_lot::{Mutex, RwLock};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::cancellation::{stop_signal, StopListener, StopSignal};
use super::stats::{SupervisorCounters, SupervisorStats};
use super::types::*;
use crate::config::{BackendConfig, HealthConfig, SupervisorConfig};
use crate::http_client::HealthClient;

struct BackendProcess {
    child: Child,
    pid: Option<u32>,
    spawned_at: Instant,
}

struct Monitor {
    stop: StopSignal,
    handle: JoinHandle<()>,
}

struct Inner {
    backend: BackendConfig,
    health_config: HealthConfig,
    forward_output: bool,
    client: HealthClient,
    process: tokio::sync::Mutex<Option<BackendProcess>>,
    monitor: Mutex<Option<Monitor>>,
    health: RwLock<ProcessHealth>,
    health_tx: broadcast::Sender<ProcessHealth>,
    counters: SupervisorCounters,
    // Serializes start/stop/restart so their transitions never interleave.
    lifecycle: tokio::sync::Mutex<()>,
}

/// Owns the backend child process and its health-poll loop.
pub struct ProcessSupervisor {
    inner: Arc<Inner>,
}

impl ProcessSupervisor {
    pub fn new(backend: BackendConfig, health: HealthConfig) -> NewworkResult<Self> {
        Self::build(backend, health, true)
    }

    pub fn from_config(config: &SupervisorConfig) -> NewworkResult<Self> {
        Self::build(
            config.backend.clone(),
            config.health.clone(),
            config.logging.backend_output,
        )
    }

    fn build(backend: BackendConfig, health: HealthConfig, forward_output: bool) -> NewworkResult<Self> {
        let client = HealthClient::new(backend.health_url(&health.path), health.timeout())?;
        let (health_tx, _) = broadcast::channel(HEALTH_CHANNEL_CAPACITY);

        Ok(Self {
            inner: Arc::new(Inner {
                backend,
                health_config: health,
                forward_output,
                client,
                process: tokio::sync::Mutex::new(None),
                monitor: Mutex::new(None),
                health: RwLock::new(ProcessHealth::stopped()),
                health_tx,
                counters: SupervisorCounters::default(),
                lifecycle: tokio::sync::Mutex::new(()),
            }),
        })
    }

    pub async fn start(&self) -> NewworkResult<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        self.start_locked(ProcessStatus::Starting).await
    }

    pub async fn stop(&self) -> NewworkResult<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        self.halt_monitor().await;
        let result = self.kill_child().await;
        self.inner.publish(ProcessHealth::stopped());
        info!("Backend stopped");
        result
    }

    pub async fn restart_backend(&self) -> NewworkResult<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        SupervisorCounters::bump(&self.inner.counters.restarts);
        info!("Restarting backend");

        self.halt_monitor().await;
        let current = self.inner.health.read().clone();
        self.inner.publish(current.transition(ProcessStatus::Restarting));

        self.kill_child().await?;
        self.start_locked(ProcessStatus::Restarting).await
    }

    pub async fn check_health(&self) -> bool {
        match self.inner.client.probe().await {
            Ok(latency) => {
                debug!("On-demand health check ok ({:?})", latency);
                true
            }
            Err(e) => {
                debug!("On-demand health check failed: {}", e);
                false
            }
        }
    }

    pub fn health(&self) -> ProcessHealth {
        self.inner.health.read().clone()
    }

    pub fn status(&self) -> ProcessStatus {
        self.inner.health.read().status
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProcessHealth> {
        self.inner.health_tx.subscribe()
    }

    pub fn pid(&self) -> Option<u32> {
        self.inner.health.read().pid
    }

    pub fn health_url(&self) -> &str {
        self.inner.client.url()
    }

    pub async fn stats(&self) -> SupervisorStats {
        let uptime = self
            .inner
            .process
            .lock()
            .await
            .as_ref()
            .map(|p| p.spawned_at.elapsed().as_secs());
        let health = self.health();
        SupervisorStats::collect(&self.inner.counters, health.status, health.pid, uptime)
    }

    async fn start_locked(&self, status: ProcessStatus) -> NewworkResult<()> {
        let pid = {
            let mut slot = self.inner.process.lock().await;

            if let Some(process) = slot.as_mut() {
                match process.child.try_wait() {
                    Ok(None) => {
                        debug!("Backend already running (pid {:?})", process.pid);
                        return Ok(());
                    }
                    Ok(Some(exit)) => debug!("Clearing exited backend ({})", exit),
                    Err(e) => warn!("Failed to poll previous backend: {}", e),
                }
                *slot = None;
            }

            let process = match self.spawn_child() {
                Ok(process) => process,
                Err(e) => {
                    error!("{}", e);
                    let failed = ProcessHealth {
                        error_message: Some(e.to_string()),
                        ..ProcessHealth::with_status(ProcessStatus::Error)
                    };
                    self.inner.publish(failed);
                    return Err(e);
                }
            };

            let pid = process.pid;
            *slot = Some(process);
            pid
        };

        SupervisorCounters::bump(&self.inner.counters.starts);
        info!(
            "Backend spawned (pid {:?}), probing {}",
            pid,
            self.inner.client.url()
        );

        self.inner.publish(ProcessHealth {
            pid,
            ..ProcessHealth::with_status(status)
        });
        self.spawn_monitor();
        Ok(())
    }

    fn spawn_child(&self) -> NewworkResult<BackendProcess> {
        let backend = &self.inner.backend;
        let output = || {
            if self.inner.forward_output {
                Stdio::piped()
            } else {
                Stdio::null()
            }
        };

        let mut command = Command::new(&backend.program);
        command
            .args(backend.command_args())
            .envs(&backend.env)
            .stdin(Stdio::null())
            .stdout(output())
            .stderr(output())
            .kill_on_drop(true);

        if let Some(dir) = &backend.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            NewworkError::Spawn(format!("{}: {}", backend.program.display(), e))
        })?;

        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, "stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, "stderr");
        }

        Ok(BackendProcess {
            pid: child.id(),
            child,
            spawned_at: Instant::now(),
        })
    }

    fn spawn_monitor(&self) {
        let (stop, listener) = stop_signal();
        let handle = tokio::spawn(monitor_loop(Arc::clone(&self.inner), listener));

        if let Some(previous) = self.inner.monitor.lock().replace(Monitor { stop, handle }) {
            previous.stop.trigger();
            previous.handle.abort();
        }
    }

    async fn halt_monitor(&self) {
        let monitor = self.inner.monitor.lock().take();

        if let Some(Monitor { stop, mut handle }) = monitor {
            stop.trigger();
            if tokio::time::timeout(MONITOR_SHUTDOWN_TIMEOUT, &mut handle)
                .await
                .is_err()
            {
                warn!("Health monitor did not stop in time, aborting");
                handle.abort();
            }
        }
    }

    async fn kill_child(&self) -> NewworkResult<()> {
        let process = self.inner.process.lock().await.take();

        match process {
            Some(mut process) => {
                let code = terminate(&mut process, self.inner.backend.stop_grace()).await?;
                debug!("Backend pid {:?} exited with {:?}", process.pid, code);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        if let Some(monitor) = self.inner.monitor.lock().take() {
            monitor.stop.trigger();
            monitor.handle.abort();
        }
    }
}

#[async_trait]
impl BackendControl for ProcessSupervisor {
    async fn start(&self) -> NewworkResult<()> {
        ProcessSupervisor::start(self).await
    }

    async fn stop(&self) -> NewworkResult<()> {
        ProcessSupervisor::stop(self).await
    }

    async fn restart_backend(&self) -> NewworkResult<()> {
        ProcessSupervisor::restart_backend(self).await
    }

    async fn check_health(&self) -> bool {
        ProcessSupervisor::check_health(self).await
    }

    fn health(&self) -> ProcessHealth {
        ProcessSupervisor::health(self)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProcessHealth> {
        ProcessSupervisor::subscribe(self)
    }
}

impl Inner {
    fn publish(&self, next: ProcessHealth) {
        let previous = {
            let mut health = self.health.write();
            std::mem::replace(&mut *health, next.clone()).status
        };

        if previous != next.status {
            info!("Backend status: {} -> {}", previous, next.status);
        }

        // No subscribers is fine.
        let _ = self.health_tx.send(next);
    }

    /// Takes the child out of its slot if it has exited.
    async fn reap_exited(&self) -> Option<Option<i32>> {
        let mut slot = self.process.lock().await;
        let process = slot.as_mut()?;

        match process.child.try_wait() {
            Ok(Some(status)) => {
                *slot = None;
                Some(status.code())
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to poll backend process: {}", e);
                None
            }
        }
    }

    fn record_probe(&self, result: NewworkResult<Duration>) {
        SupervisorCounters::bump(&self.counters.probes);
        let current = self.health.read().clone();

        let next = match result {
            Ok(latency) => current.healthy(latency.as_millis() as u64),
            Err(e) => {
                SupervisorCounters::bump(&self.counters.probe_failures);
                let threshold = match current.status {
                    ProcessStatus::Starting | ProcessStatus::Restarting => {
                        self.health_config.startup_failure_threshold
                    }
                    _ => self.health_config.failure_threshold,
                };
                debug!(
                    "Health probe failed ({}/{}): {}",
                    current.consecutive_failures + 1,
                    threshold,
                    e
                );
                current.probe_failed(e.to_string(), threshold)
            }
        };

        self.publish(next);
    }
}

async fn monitor_loop(inner: Arc<Inner>, mut stop: StopListener) {
    let mut interval = tokio::time::interval(inner.health_config.poll_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = stop.triggered() => break,
            _ = interval.tick() => {}
        }

        if let Some(code) = inner.reap_exited().await {
            SupervisorCounters::bump(&inner.counters.unexpected_exits);
            warn!("Backend exited unexpectedly (code {:?})", code);
            let current = inner.health.read().clone();
            inner.publish(current.exited(code));
            break;
        }

        let result = tokio::select! {
            _ = stop.triggered() => break,
            result = inner.client.probe() => result,
        };

        if stop.is_triggered() {
            break;
        }
        inner.record_probe(result);
    }

    debug!("Health monitor stopped");
}

fn forward_lines<R>(reader: R, stream: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(target: BACKEND_LOG_TARGET, stream, "{}", line);
        }
    });
}

/// SIGTERM, then SIGKILL once `grace` elapses. Returns the exit code if any.
async fn terminate(process: &mut BackendProcess, grace: Duration) -> NewworkResult<Option<i32>> {
    if let Ok(Some(status)) = process.child.try_wait() {
        return Ok(status.code());
    }

    #[cfg(unix)]
    if let Some(pid) = process.pid {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            warn!("Failed to send SIGTERM to backend pid {}: {}", pid, e);
        }
    }

    match tokio::time::timeout(grace, process.child.wait()).await {
        Ok(Ok(status)) => Ok(status.code()),
        Ok(Err(e)) => Err(NewworkError::Process(format!(
            "Failed to wait for backend exit: {}",
            e
        ))),
        Err(_) => {
            warn!("Backend did not exit within {:?}, killing", grace);
            process
                .child
                .kill()
                .await
                .map_err(|e| NewworkError::Process(format!("Failed to kill backend: {}", e)))?;
            Ok(None)
        }
    }
}
