use std::time::Duration;

use async_trait::async_trait;

use crate::client::error::{ProviderError, Result};

pub const MAINNET_JSON_RPC: &str = "https://toncenter.com/api/v2/jsonRPC";
pub const TESTNET_JSON_RPC: &str = "https://testnet.toncenter.com/api/v2/jsonRPC";

pub const API_KEY_ENV: &str = "TONCENTER_API_KEY";
pub const BASE_URL_ENV: &str = "TONCENTER_URL";

#[derive(Debug, Clone)]
pub struct ClientParams {
    /// Request timeout in seconds
    pub timeout: Option<u64>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Extra attempts after a transient failure
    pub max_retries: Option<u64>,
}

impl Default for ClientParams {
    fn default() -> Self {
        Self {
            timeout: Some(5),
            api_key: None,
            base_url: None,
            max_retries: Some(3),
        }
    }
}

impl ClientParams {
    pub fn testnet() -> Self {
        Self {
            base_url: Some(TESTNET_JSON_RPC.to_string()),
            ..Self::default()
        }
    }

    /// Defaults overridden by `TONCENTER_API_KEY` and `TONCENTER_URL`
    pub fn from_env() -> Self {
        let mut params = Self::default();
        if let Ok(api_key) = std::env::var(API_KEY_ENV) {
            if !api_key.is_empty() {
                params.api_key = Some(api_key);
            }
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                params.base_url = Some(url);
            }
        }
        params
    }

    pub fn url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(MAINNET_JSON_RPC)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Transport used by the provider to POST JSON bodies
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Blocking `ureq` agent driven from the tokio blocking pool
#[derive(Debug, Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl HttpClient for UreqClient {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || {
            let mut builder = agent.post(request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            let mut response = builder
                .send(request.body.as_bytes())
                .map_err(|e| ProviderError::Transport(e.to_string()))?;
            let status = response.status().as_u16();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ProviderError::Transport(e.to_string()))?;
            Ok(HttpResponse { status, body })
        })
        .await
        .map_err(|e| ProviderError::Transport(e.to_string()))?
    }
}
