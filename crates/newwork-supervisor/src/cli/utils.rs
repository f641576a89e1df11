use super::commands::{Cli, OutputFormat};
use newwork_supervisor::LoggingConfig;
use newwork_types::{NewworkError, NewworkResult};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init_logging(cli: &Cli, logging: Option<&LoggingConfig>) {
    let level = if cli.quiet {
        "warn".to_string()
    } else {
        match cli.verbose {
            0 => logging
                .map(|l| l.level.to_string())
                .unwrap_or_else(|| "info".to_string()),
            1 => "info,newwork_supervisor=debug".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&level));

    let json = logging.map(|l| l.json).unwrap_or(false);
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| logging.and_then(|l| l.file.clone()));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let file = match log_file {
        Some(ref path) => match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Failed to open log file {:?}: {}, logging to stdout", path, e);
                None
            }
        },
        None => None,
    };

    match (file, json) {
        (Some(file), true) => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::sync::Mutex::new(file));
            subscriber.with(layer).init();
        }
        (Some(file), false) => {
            let layer = fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false);
            subscriber.with(layer).init();
        }
        (None, true) => {
            subscriber.with(fmt::layer().json()).init();
        }
        (None, false) => {
            let layer = fmt::layer().with_target(cli.verbose >= 2);
            subscriber.with(layer).init();
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> NewworkResult<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| NewworkError::Serialization(format!("Failed to encode output: {}", e)))?;
    println!("{}", out);
    Ok(())
}

pub fn status_line(format: OutputFormat, label: &str, ok: bool, detail: &str) {
    if format == OutputFormat::Json {
        return;
    }
    let mark = if ok {
        "\x1b[38;5;46mOK\x1b[0m"
    } else {
        "\x1b[38;5;196mFAIL\x1b[0m"
    };
    if detail.is_empty() {
        println!("{:<22}{}", label, mark);
    } else {
        println!("{:<22}{} - {}", label, mark, detail);
    }
}
