use newwork_types::{DEFAULT_BACKEND_PORT, HEALTH_ENDPOINT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use super::constants::DEFAULT_STOP_GRACE_MS;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub host: IpAddr,
    pub port: u16,
    pub working_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub stop_grace_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("newwork-backend"),
            args: Vec::new(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_BACKEND_PORT,
            working_dir: None,
            env: BTreeMap::new(),
            stop_grace_ms: DEFAULT_STOP_GRACE_MS,
        }
    }
}

impl BackendConfig {
    /// Configured arguments followed by the fixed `--host`/`--port` pair.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--host".to_string());
        args.push(self.host.to_string());
        args.push("--port".to_string());
        args.push(self.port.to_string());
        args
    }

    pub fn base_url(&self) -> String {
        match self.host {
            IpAddr::V4(v4) => format!("http://{}:{}", v4, self.port),
            IpAddr::V6(v6) => format!("http://[{}]:{}", v6, self.port),
        }
    }

    pub fn health_url(&self, path: &str) -> String {
        let path = if path.is_empty() { HEALTH_ENDPOINT } else { path };
        if path.starts_with('/') {
            format!("{}{}", self.base_url(), path)
        } else {
            format!("{}/{}", self.base_url(), path)
        }
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}
