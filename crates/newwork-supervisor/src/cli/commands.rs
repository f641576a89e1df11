use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "newwork")]
#[command(version = BUILD_VERSION)]
#[command(about = "NewWork Supervisor - Launches, monitors and recovers the local backend")]
#[command(long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(short, long, global = true, value_name = "FILE", help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(short = 'd', long, global = true, value_name = "DIR", env = "NEWWORK_DATA_DIR", help = "Data directory path")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase verbosity (-v, -vv, -vvv)")]
    pub verbose: u8,

    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[arg(long, global = true, value_name = "FILE", help = "Write logs to file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text", help = "Output format")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start and supervise the backend")]
    #[command(long_about = "Start the NewWork backend and keep it healthy.\n\nThe backend is polled on its health endpoint, restarted on crashes and escalated to a graceful restart when quick restarts keep failing. SIGHUP triggers a graceful restart; SIGINT or SIGTERM stops everything.")]
    Run {
        #[arg(long, value_name = "FILE", help = "Write PID to file")]
        pid_file: Option<PathBuf>,
    },

    #[command(about = "Probe the backend health endpoint once")]
    Check {
        #[arg(long, help = "Also validate configuration and storage")]
        full: bool,
    },

    #[command(about = "Start the backend and run one graceful restart")]
    Restart {
        #[arg(long, help = "Use a quick restart instead of the graceful protocol")]
        quick: bool,
    },

    #[command(about = "Inspect saved application state")]
    State {
        #[command(subcommand)]
        action: StateAction,
    },

    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    #[command(about = "Show version information")]
    Version,
}

#[derive(Subcommand)]
pub enum StateAction {
    #[command(about = "Print the saved application state")]
    Show,
    #[command(about = "Delete the saved application state")]
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    #[command(about = "Show effective configuration")]
    Show,
    #[command(about = "Write a default configuration file")]
    Init {
        #[arg(short, long, help = "Overwrite existing configuration")]
        force: bool,
    },
    #[command(about = "Print the configuration file path")]
    Path,
}
