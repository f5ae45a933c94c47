pub mod endpoints;

use std::time::Duration;

use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::GatewayConfig;
use crate::error::{Result, ShutterError};

/// Header carrying the total item count for bare-array list responses.
const TOTAL_HEADER: &str = "x-total";

/// HTTP client wrapper for the photo provider REST API.
#[derive(Debug, Clone)]
pub struct UnsplashHttpClient {
    client: Client,
    base_url: String,
    access_key: String,
}

impl UnsplashHttpClient {
    pub fn new(base_url: &str, access_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
        })
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;
        Self::new(&config.base_url, &config.access_key, config.request_timeout)
    }

    /// GET a JSON resource, also returning the `X-Total` header if present.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<(T, Option<u64>)> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Client-ID {}", self.access_key))
            .header("Accept-Version", "v1")
            .query(query)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ShutterError::Http {
                status,
                message: provider_message(&body),
            });
        }

        let total = header_u64(resp.headers(), TOTAL_HEADER);
        let body = resp.bytes().await?;
        let value = serde_json::from_slice::<T>(&body)?;
        Ok((value, total))
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Extract the first message of a provider `{"errors": [...]}` body, falling
/// back to the raw body.
fn provider_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        errors: Vec<String>,
    }
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.errors.into_iter().next())
        .unwrap_or_else(|| body.to_string())
}
