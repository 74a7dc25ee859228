use std::time::Duration;

use futures::future::BoxFuture;
use tracing::debug;

use stepflow_core::config::SandboxConfig;
use stepflow_core::error::{Result, StepflowError};
use stepflow_core::traits::SandboxClient;
use stepflow_core::types::{SandboxRequest, SandboxResponse};

/// Sandbox client that POSTs each request to a fixed endpoint.
///
/// The underlying `reqwest::Client` keeps a connection pool and may be shared
/// by concurrent runs; it holds no per-run state.
#[derive(Clone)]
pub struct HttpSandboxClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpSandboxClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stepflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                StepflowError::SandboxRequest(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
            timeout,
        })
    }

    pub fn from_config(config: &SandboxConfig) -> Result<Self> {
        let client = Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(match &config.api_key {
            Some(key) => client.with_api_key(key.clone()),
            None => client,
        })
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_send_error(&self, e: reqwest::Error) -> StepflowError {
        if e.is_timeout() {
            StepflowError::SandboxTimeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            StepflowError::SandboxRequest(e.to_string())
        }
    }

    async fn post(&self, request: &SandboxRequest) -> Result<SandboxResponse> {
        debug!(
            endpoint = %self.endpoint,
            code_len = request.code.len(),
            context_keys = request.context.len(),
            "Sending sandbox request"
        );

        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(StepflowError::SandboxStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<SandboxResponse>(&body)
            .map_err(|e| StepflowError::SandboxParse(format!("{}: {}", e, body)))
    }
}

impl SandboxClient for HttpSandboxClient {
    fn execute(&self, request: SandboxRequest) -> BoxFuture<'_, Result<SandboxResponse>> {
        Box::pin(async move { self.post(&request).await })
    }
}
