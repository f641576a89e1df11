use newwork_supervisor::{SupervisorConfig, SupervisorStack};
use newwork_types::{NewworkError, NewworkResult, ProcessStatus, RestartPhase};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub async fn run_supervisor(config: SupervisorConfig, pid_file: Option<PathBuf>) -> NewworkResult<()> {
    info!("Starting NewWork supervisor v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", config.data_dir);

    std::fs::create_dir_all(&config.data_dir)
        .map_err(|e| NewworkError::Config(format!("Failed to create data directory: {}", e)))?;

    if let Some(ref pid_path) = pid_file {
        std::fs::write(pid_path, std::process::id().to_string())
            .map_err(|e| NewworkError::Config(format!("Failed to write PID file: {}", e)))?;
        info!("PID file written: {:?}", pid_path);
    }

    let stack = Arc::new(SupervisorStack::build(config)?);
    let reporter = spawn_event_reporter(&stack);

    let result = supervise(&stack).await;

    info!("Shutting down...");
    reporter.abort();
    let stopped = stack.shutdown().await;

    if let Some(ref pid_path) = pid_file {
        let _ = std::fs::remove_file(pid_path);
    }

    result.and(stopped)?;
    info!("Shutdown complete");
    Ok(())
}

async fn supervise(stack: &Arc<SupervisorStack>) -> NewworkResult<()> {
    stack.start().await?;
    println!(
        "NewWork backend supervised at \x1b[38;5;51m{}\x1b[0m (Ctrl+C to stop)",
        stack.supervisor().health_url()
    );

    wait_for_shutdown(stack).await
}

/// Logs every health, recovery and restart event until aborted.
fn spawn_event_reporter(stack: &SupervisorStack) -> JoinHandle<()> {
    let mut health = stack.supervisor().subscribe();
    let mut recovery = stack.coordinator().subscribe();
    let mut progress = stack.orchestrator().subscribe();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = health.recv() => match event {
                    Ok(h) => match h.status {
                        ProcessStatus::Error | ProcessStatus::Unresponsive => warn!(
                            "Backend {}: {}",
                            h.status,
                            h.error_message.as_deref().unwrap_or("no details")
                        ),
                        status => debug!("Backend {} (pid {:?})", status, h.pid),
                    },
                    Err(RecvError::Lagged(n)) => debug!("Health reporter skipped {} updates", n),
                    Err(RecvError::Closed) => break,
                },
                event = recovery.recv() => match event {
                    Ok(e) => info!("Recovery: {}", e),
                    Err(RecvError::Lagged(n)) => debug!("Recovery reporter skipped {} events", n),
                    Err(RecvError::Closed) => break,
                },
                event = progress.recv() => match event {
                    Ok(p) if p.phase == RestartPhase::Failed => error!(
                        "Restart {} failed at {:.0}%: {}",
                        p.run_id,
                        p.progress * 100.0,
                        p.error_message.as_deref().unwrap_or("unknown error")
                    ),
                    Ok(p) => info!("Restart {} [{:.0}%] {}", p.phase, p.progress * 100.0, p.message),
                    Err(RecvError::Lagged(n)) => debug!("Progress reporter skipped {} events", n),
                    Err(RecvError::Closed) => break,
                },
            }
        }
    })
}

/// Returns on SIGINT/SIGTERM. SIGHUP runs a graceful restart in the
/// background and keeps waiting.
async fn wait_for_shutdown(stack: &Arc<SupervisorStack>) -> NewworkResult<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let install = |kind: SignalKind, name: &str| {
            signal(kind).map_err(|e| {
                NewworkError::Internal(format!("Failed to install {} handler: {}", name, e))
            })
        };
        let mut sigterm = install(SignalKind::terminate(), "SIGTERM")?;
        let mut sigint = install(SignalKind::interrupt(), "SIGINT")?;
        let mut sighup = install(SignalKind::hangup(), "SIGHUP")?;

        loop {
            tokio::select! {
                _ = sigterm.recv() => { info!("Received SIGTERM"); break; }
                _ = sigint.recv() => { info!("Received SIGINT"); break; }
                _ = sighup.recv() => {
                    info!("Received SIGHUP - performing graceful restart");
                    let orchestrator = Arc::clone(stack.orchestrator());
                    tokio::spawn(async move {
                        if !orchestrator.perform_graceful_restart(None).await {
                            warn!("Graceful restart on SIGHUP did not complete");
                        }
                    });
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = stack;
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| NewworkError::Internal(format!("Failed to install Ctrl+C handler: {}", e)))?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
