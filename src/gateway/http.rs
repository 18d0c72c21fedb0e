use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;

use super::{ApiGateway, ErrorPayload, GatewayResult, Method};

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-Cisco-Meraki-API-Key";

/// [`ApiGateway`] backed by the Meraki Dashboard REST API.
pub struct HttpGateway {
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpGateway {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: Client::builder()
                .timeout(timeout)
                .connect_timeout(Duration::from_secs(10))
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Build a gateway from configuration. Returns `None` when no API key is configured.
    pub fn from_config(config: &ApiConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        Some(Self::new(&config.base_url, api_key, config.timeout()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> GatewayResult {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        let mut builder = builder
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!("{} {} failed: {}", method, path, e);
            ErrorPayload::transport(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ErrorPayload::transport(e.to_string()))?;

        if !status.is_success() {
            warn!("{} {} returned {}", method, path, status);
            return Err(ErrorPayload::http(status.as_u16(), text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }

        serde_json::from_str(&text)
            .map_err(|e| ErrorPayload::transport(format!("invalid JSON in response: {e}")))
    }
}
