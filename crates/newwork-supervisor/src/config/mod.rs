mod backend;
mod constants;
mod health;
mod logging;
mod recovery;
mod restart;
mod retry;
mod storage;
mod supervisor;
mod types;

pub use backend::BackendConfig;
pub use constants::*;
pub use health::HealthConfig;
pub use logging::LoggingConfig;
pub use recovery::RecoveryConfig;
pub use restart::RestartConfig;
pub use retry::RetryConfig;
pub use storage::StorageConfig;
pub use supervisor::SupervisorConfig;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_default_config_validation() {
        let config = SupervisorConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backend_defaults_to_loopback() {
        let config = SupervisorConfig::default();
        assert_eq!(config.backend.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.backend.port, 8000);
        assert_eq!(
            config.backend.health_url(&config.health.path),
            "http://127.0.0.1:8000/health"
        );
    }

    #[test]
    fn test_command_args_append_host_and_port() {
        let mut backend = BackendConfig::default();
        backend.args = vec!["serve".to_string()];
        backend.port = 8123;
        assert_eq!(
            backend.command_args(),
            vec!["serve", "--host", "127.0.0.1", "--port", "8123"]
        );
    }

    #[test]
    fn test_invalid_port() {
        let mut config = SupervisorConfig::default();
        config.backend.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_loopback_host_rejected() {
        let mut config = SupervisorConfig::default();
        config.backend.host = IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_retry_policy_rejected() {
        let mut config = SupervisorConfig::default();
        config.retry.api.base_delay_ms = 50_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_health_attempts_rejected() {
        let mut config = SupervisorConfig::default();
        config.restart.health_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ipv6_health_url() {
        let mut backend = BackendConfig::default();
        backend.host = IpAddr::V6(std::net::Ipv6Addr::LOCALHOST);
        assert_eq!(backend.health_url("health"), "http://[::1]:8000/health");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: SupervisorConfig = toml::from_str(
            r#"
            [backend]
            program = "/opt/newwork/backend"
            port = 9100

            [recovery]
            max_quick_restarts = 5
            "#,
        )
        .expect("Failed to parse");
        assert_eq!(parsed.backend.port, 9100);
        assert_eq!(parsed.recovery.max_quick_restarts, 5);
        assert!(parsed.recovery.escalate_on_limit);
        assert_eq!(parsed.health.path, "/health");
        assert_eq!(parsed.retry.api, crate::retry::RetryPolicy::API);
    }

    #[test]
    fn test_config_serialization() {
        let config = SupervisorConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize");
        let parsed: SupervisorConfig = toml::from_str(&toml_str).expect("Failed to parse");
        assert_eq!(parsed.backend.port, config.backend.port);
        assert_eq!(parsed.retry.reconnect, config.retry.reconnect);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("newwork-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join(CONFIG_FILE_NAME);

        let mut config = SupervisorConfig::default();
        config.backend.port = 8765;
        config.save(&path).expect("Failed to save");

        let loaded = SupervisorConfig::load(&path).expect("Failed to load");
        assert_eq!(loaded.backend.port, 8765);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_state_db_path_defaults_under_data_dir() {
        let mut config = SupervisorConfig::default();
        config.data_dir = std::path::PathBuf::from("/tmp/newwork-test");
        assert_eq!(
            config.resolved_storage().path,
            std::path::PathBuf::from("/tmp/newwork-test/state")
        );

        config.storage.path = std::path::PathBuf::from("/var/lib/newwork/db");
        assert_eq!(config.state_db_path(), std::path::PathBuf::from("/var/lib/newwork/db"));
    }

    #[test]
    fn test_display_summary() {
        let config = SupervisorConfig::default();
        assert!(format!("{}", config).contains("/health"));
    }
}
