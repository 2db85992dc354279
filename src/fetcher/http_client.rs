use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::watch;
use url::Url;

use crate::app::{NetworkError, Result};
use crate::config::ApiConfig;
use crate::domain::Settings;
use crate::fetcher::{ApiClient, QueryParams};

const API_KEY_PARAM: &str = "apiKey";

/// reqwest-based client for the news API.
///
/// Every request carries the API key as a query parameter. While the
/// settings say offline reading is on, requests fail before touching the
/// network.
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    settings: watch::Receiver<Settings>,
}

impl HttpApiClient {
    pub fn new(config: &ApiConfig, settings: watch::Receiver<Settings>) -> Result<Self> {
        // Validate once so request URLs can be built by concatenation
        let base_url = Url::parse(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .default_headers(headers)
            .user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(NetworkError::from)?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            settings,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn is_offline(&self) -> bool {
        self.settings.borrow().offline_reading
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn get(&self, path: &str, query: &QueryParams<'_>) -> std::result::Result<Value, NetworkError> {
        if self.is_offline() {
            tracing::debug!(path, "request blocked by offline mode");
            return Err(NetworkError::OfflineModeActive);
        }

        let mut params: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        params.push((API_KEY_PARAM, self.api_key.as_str()));

        let response = self
            .client
            .get(self.endpoint(path))
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(path, status = status.as_u16(), "news API returned an error status");
            return Err(NetworkError::from_status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| NetworkError::Parse(e.to_string()))
    }
}
