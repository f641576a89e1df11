use super::commands::{ConfigAction, OutputFormat};
use super::utils::print_json;
use newwork_supervisor::SupervisorConfig;
use newwork_types::{NewworkError, NewworkResult};
use std::path::Path;

pub fn handle_config(
    config_path: &Path,
    data_dir: &Path,
    config: NewworkResult<SupervisorConfig>,
    action: Option<ConfigAction>,
    format: OutputFormat,
) -> NewworkResult<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            let config = config?;
            match format {
                OutputFormat::Json => print_json(&config)?,
                OutputFormat::Text => {
                    if !config_path.exists() {
                        println!("\x1b[38;5;245mNo configuration file at {:?}, showing defaults\x1b[0m", config_path);
                        println!();
                    }
                    println!("{}", config);
                }
            }
        }
        Some(ConfigAction::Init { force }) => {
            if config_path.exists() && !force {
                return Err(NewworkError::Config(format!(
                    "{:?} already exists (use --force to overwrite)",
                    config_path
                )));
            }
            let fresh = SupervisorConfig {
                data_dir: data_dir.to_path_buf(),
                ..Default::default()
            };
            fresh.save(config_path)?;
            println!("\x1b[38;5;46m[+]\x1b[0m Configuration written to {:?}", config_path);
        }
        Some(ConfigAction::Path) => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}
