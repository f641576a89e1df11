mod checks;
mod commands;
mod config_cmd;
mod restart_cmd;
mod run;
mod state_cmd;
mod utils;

pub use checks::run_checks;
pub use commands::{Cli, Commands, OutputFormat};
pub use config_cmd::handle_config;
pub use restart_cmd::restart_backend;
pub use run::run_supervisor;
pub use state_cmd::handle_state;
pub use utils::{init_logging, print_json};
