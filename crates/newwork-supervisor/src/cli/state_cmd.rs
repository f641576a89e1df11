use super::commands::{OutputFormat, StateAction};
use super::utils::print_json;
use newwork_supervisor::{StateStore, SupervisorConfig};
use newwork_types::NewworkResult;

pub fn handle_state(config: &SupervisorConfig, action: StateAction, format: OutputFormat) -> NewworkResult<()> {
    let store = StateStore::open(config.resolved_storage())?;

    match action {
        StateAction::Show => match (store.load_app_state()?, format) {
            (state, OutputFormat::Json) => print_json(&state)?,
            (Some(state), OutputFormat::Text) => {
                println!("Saved at:   {}", state.saved_at.to_rfc3339());
                println!("Session:    {}", state.active_session_id.as_deref().unwrap_or("-"));
                println!("Workspace:  {}", state.active_workspace_id.as_deref().unwrap_or("-"));
                println!(
                    "Tab:        {}",
                    state.active_tab_index.map(|i| i.to_string()).unwrap_or_else(|| "-".into())
                );
                for (key, value) in &state.additional_data {
                    println!("  {} = {}", key, value);
                }
            }
            (None, OutputFormat::Text) => {
                println!("\x1b[38;5;245mNo saved application state\x1b[0m");
            }
        },
        StateAction::Clear => {
            let removed = store.clear_app_state()?;
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({ "cleared": removed }))?,
                OutputFormat::Text if removed => println!("\x1b[38;5;46m[+]\x1b[0m Saved state cleared"),
                OutputFormat::Text => println!("\x1b[38;5;245mNothing to clear\x1b[0m"),
            }
        }
    }

    Ok(())
}
