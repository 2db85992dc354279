pub mod http_client;

use async_trait::async_trait;
use serde_json::Value;

use crate::app::NetworkError;

pub use http_client::HttpApiClient;

/// Query parameters for a single API call, in request order.
pub type QueryParams<'a> = [(&'a str, String)];

#[async_trait]
pub trait ApiClient {
    /// GET `path` relative to the API base and decode the JSON body.
    async fn get(&self, path: &str, query: &QueryParams<'_>) -> Result<Value, NetworkError>;
}
