use super::commands::OutputFormat;
use super::utils::print_json;
use newwork_supervisor::{SupervisorConfig, SupervisorStack};
use newwork_types::{NewworkError, NewworkResult, RestartProgress};
use tracing::info;

/// Starts the backend, runs one restart and stops it again, printing every
/// progress event.
pub async fn restart_backend(config: SupervisorConfig, quick: bool, format: OutputFormat) -> NewworkResult<()> {
    let stack = SupervisorStack::build(config)?;
    let mut progress = stack.orchestrator().subscribe();

    stack.start().await?;
    info!("Backend started, running {} restart", if quick { "quick" } else { "graceful" });

    let completed = if quick {
        stack.orchestrator().quick_restart_backend().await
    } else {
        let saved = stack.store().load_app_state()?;
        stack.orchestrator().perform_graceful_restart(saved).await
    };

    let mut events: Vec<RestartProgress> = Vec::new();
    while let Ok(event) = progress.try_recv() {
        events.push(event);
    }

    stack.shutdown().await?;

    match format {
        OutputFormat::Json => print_json(&events)?,
        OutputFormat::Text => {
            for event in &events {
                match event.error_message {
                    Some(ref reason) => println!("[{:>3.0}%] {:<10} {}", event.progress * 100.0, event.phase, reason),
                    None => println!("[{:>3.0}%] {:<10} {}", event.progress * 100.0, event.phase, event.message),
                }
            }
        }
    }

    if completed {
        Ok(())
    } else {
        Err(NewworkError::Recovery("restart did not complete".into()))
    }
}
