//! Service Probe Adapters
//!
//! Implements the `ServiceProbe` port. The HTTP probe treats any response,
//! whatever its status, as a running service. Only connection errors and
//! timeouts count as down.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::domain::ports::ServiceProbe;
use crate::error::{Error, Result};

/// Status endpoint probed when none is configured: the master's info port.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:60010/";

/// Default timeout for the liveness request.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probes the storage service's status endpoint over HTTP.
pub struct HttpServiceProbe {
    url: String,
    client: Client,
}

impl HttpServiceProbe {
    /// Create a probe for `url` with the given request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl std::fmt::Debug for HttpServiceProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServiceProbe")
            .field("url", &self.url)
            .finish()
    }
}

#[async_trait]
impl ServiceProbe for HttpServiceProbe {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn is_running(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) => {
                // Any answer, error statuses included, means something is serving
                debug!("Service probe answered with {}", response.status());
                true
            }
            Err(e) => {
                debug!("Service probe failed (service is down): {}", e);
                false
            }
        }
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

/// Probe with a fixed answer. Used when the check is disabled and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticServiceProbe {
    running: bool,
}

impl StaticServiceProbe {
    /// A probe reporting the service as down.
    pub fn offline() -> Self {
        Self { running: false }
    }

    /// A probe reporting the service as up.
    pub fn online() -> Self {
        Self { running: true }
    }
}

#[async_trait]
impl ServiceProbe for StaticServiceProbe {
    async fn is_running(&self) -> bool {
        self.running
    }

    fn endpoint(&self) -> String {
        "static".to_string()
    }
}
