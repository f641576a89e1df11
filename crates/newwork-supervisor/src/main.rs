mod cli;

use clap::Parser;
use cli::{
    handle_config, handle_state, init_logging, print_json, restart_backend, run_checks,
    run_supervisor, Cli, Commands, OutputFormat,
};
use newwork_supervisor::SupervisorConfig;
use newwork_types::NewworkResult;
use std::path::PathBuf;

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> NewworkResult<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(|| {
        dirs::home_dir()
            .map(|h| h.join(".newwork"))
            .unwrap_or_else(|| PathBuf::from(".newwork"))
    });
    let config_path = cli.config.clone().unwrap_or_else(|| data_dir.join("config.toml"));

    let loaded = SupervisorConfig::load(&config_path).map(|mut config| {
        if cli.data_dir.is_some() {
            config.data_dir = data_dir.clone();
        }
        config
    });

    init_logging(&cli, loaded.as_ref().ok().map(|c| &c.logging));

    match cli.command {
        Commands::Run { pid_file } => {
            run_supervisor(loaded?, pid_file).await?;
        }
        Commands::Check { full } => {
            run_checks(&loaded?, full, cli.format).await?;
        }
        Commands::Restart { quick } => {
            restart_backend(loaded?, quick, cli.format).await?;
        }
        Commands::State { action } => {
            handle_state(&loaded?, action, cli.format)?;
        }
        Commands::Config { action } => {
            handle_config(&config_path, &data_dir, loaded, action, cli.format)?;
        }
        Commands::Version => match cli.format {
            OutputFormat::Json => print_json(&serde_json::json!({
                "name": "newwork",
                "version": BUILD_VERSION,
                "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            }))?,
            OutputFormat::Text => {
                println!("newwork {}", BUILD_VERSION);
                println!("  Profile:   {}", if cfg!(debug_assertions) { "debug" } else { "release" });
                println!("  Storage:   sled");
            }
        },
    }

    Ok(())
}
