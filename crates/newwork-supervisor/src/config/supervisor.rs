use newwork_types::{NewworkError, NewworkResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::backend::BackendConfig;
use super::constants::{CONFIG_FILE_NAME, STATE_DB_DIR};
use super::health::HealthConfig;
use super::logging::LoggingConfig;
use super::recovery::RecoveryConfig;
use super::restart::RestartConfig;
use super::retry::RetryConfig;
use super::storage::StorageConfig;
use super::types::LogLevel;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub data_dir: PathBuf,
    pub backend: BackendConfig,
    pub health: HealthConfig,
    pub retry: RetryConfig,
    pub recovery: RecoveryConfig,
    pub restart: RestartConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".newwork"))
            .unwrap_or_else(|| PathBuf::from(".newwork"));

        Self {
            data_dir,
            backend: BackendConfig::default(),
            health: HealthConfig::default(),
            retry: RetryConfig::default(),
            recovery: RecoveryConfig::default(),
            restart: RestartConfig::default(),
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl SupervisorConfig {
    pub fn load(path: impl AsRef<Path>) -> NewworkResult<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| NewworkError::Config(format!("Failed to read config: {}", e)))?;

            toml::from_str(&contents)
                .map_err(|e| NewworkError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            info!("Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> NewworkResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| NewworkError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| NewworkError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path.as_ref(), contents)
            .map_err(|e| NewworkError::Config(format!("Failed to write config: {}", e)))?;

        info!("Configuration saved to {:?}", path.as_ref());
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("NEWWORK_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Ok(program) = std::env::var("NEWWORK_BACKEND_PROGRAM") {
            self.backend.program = PathBuf::from(program);
        }

        if let Ok(host) = std::env::var("NEWWORK_BACKEND_HOST") {
            match host.parse() {
                Ok(addr) => self.backend.host = addr,
                Err(_) => warn!("Ignoring invalid NEWWORK_BACKEND_HOST: {}", host),
            }
        }

        if let Ok(port) = std::env::var("NEWWORK_BACKEND_PORT") {
            if let Ok(p) = port.parse() {
                self.backend.port = p;
            }
        }

        if let Ok(interval) = std::env::var("NEWWORK_HEALTH_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.health.poll_interval_ms = ms;
            }
        }

        if let Ok(level) = std::env::var("NEWWORK_LOG_LEVEL") {
            self.logging.level = LogLevel::parse(&level);
        }

        if std::env::var("NEWWORK_LOG_JSON").is_ok() {
            self.logging.json = true;
        }
    }

    pub fn validate(&self) -> NewworkResult<()> {
        if self.backend.port == 0 {
            return Err(NewworkError::Config("Backend port cannot be 0".into()));
        }

        if !self.backend.host.is_loopback() {
            return Err(NewworkError::Config(format!(
                "Backend host must be a loopback address, got {}",
                self.backend.host
            )));
        }

        if self.backend.program.as_os_str().is_empty() {
            return Err(NewworkError::Config("Backend program cannot be empty".into()));
        }

        if self.health.poll_interval_ms == 0 {
            return Err(NewworkError::Config("Health poll interval cannot be 0".into()));
        }

        if self.health.timeout_ms == 0 {
            return Err(NewworkError::Config("Health probe timeout cannot be 0".into()));
        }

        if self.health.failure_threshold == 0 || self.health.startup_failure_threshold == 0 {
            return Err(NewworkError::Config(
                "Health failure thresholds must be at least 1".into(),
            ));
        }

        if self.health.timeout_ms > self.health.poll_interval_ms.saturating_mul(10) {
            warn!(
                "Health probe timeout ({}ms) is much longer than the poll interval ({}ms)",
                self.health.timeout_ms, self.health.poll_interval_ms
            );
        }

        self.retry.validate().map_err(NewworkError::Config)?;

        if self.recovery.max_quick_restarts == 0 && !self.recovery.escalate_on_limit {
            warn!("Quick restarts disabled and escalation off - backend failures will only be surfaced");
        }

        if self.restart.phase_timeout_ms == 0 {
            return Err(NewworkError::Config("Restart phase timeout cannot be 0".into()));
        }

        if self.restart.health_attempts == 0 {
            return Err(NewworkError::Config(
                "Restart health attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }

    pub fn state_db_path(&self) -> PathBuf {
        if self.storage.is_in_memory() {
            self.data_dir.join(STATE_DB_DIR)
        } else {
            self.storage.path.clone()
        }
    }

    /// Storage settings with the database path resolved against `data_dir`.
    pub fn resolved_storage(&self) -> StorageConfig {
        self.storage.clone().with_path(self.state_db_path())
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }
}

impl fmt::Display for SupervisorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Data dir:   {}", self.data_dir.display())?;
        writeln!(f, "Backend:    {} {}", self.backend.program.display(), self.backend.command_args().join(" "))?;
        writeln!(f, "Health:     {} every {}ms (timeout {}ms, unresponsive after {} failures)",
            self.backend.health_url(&self.health.path),
            self.health.poll_interval_ms,
            self.health.timeout_ms,
            self.health.failure_threshold)?;
        writeln!(f, "Recovery:   {} quick restarts / {}s, escalate on limit: {}",
            self.recovery.max_quick_restarts,
            self.recovery.quick_restart_window_secs,
            self.recovery.escalate_on_limit)?;
        write!(f, "Restart:    phase timeout {}ms, {} health attempts every {}ms",
            self.restart.phase_timeout_ms,
            self.restart.health_attempts,
            self.restart.health_interval_ms)
    }
}
