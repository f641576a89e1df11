use newwork_types::{NewworkError, NewworkResult};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::trace;

/// Probes the backend's health endpoint over loopback HTTP.
#[derive(Clone, Debug)]
pub struct HealthClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HealthClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> NewworkResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| NewworkError::Network(format!("Failed to build health client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    /// One `GET` against the health endpoint. Any non-error status counts as
    /// healthy; the response body is ignored. Returns the round-trip latency.
    pub async fn probe(&self) -> NewworkResult<Duration> {
        let started = Instant::now();
        trace!("Health probe: GET {}", self.url);

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                NewworkError::Timeout(format!("health probe exceeded {:?}", self.timeout))
            } else {
                NewworkError::Network(format!("health probe failed: {}", e))
            }
        })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(NewworkError::Http {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("health endpoint returned an error")
                    .to_string(),
            });
        }

        Ok(started.elapsed())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
