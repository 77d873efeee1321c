use std::time::Duration;

use eyedentify_config::detector::DetectorConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::DetectError;

/// HTTP client for the hosted inference API
#[derive(Clone)]
pub struct InferenceClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    data: &'a str,
}

impl InferenceClient {
    pub fn new(base_url: String, api_token: String, timeout: Duration) -> Result<Self, DetectError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    pub fn from_config(config: &DetectorConfig) -> Result<Self, DetectError> {
        Self::new(
            config.base_url.clone(),
            config.api_token.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    /// POST `{ "data": <base64 image> }` to a model and parse the JSON reply
    pub async fn post_image<T>(&self, model: &str, base64_image: &str) -> Result<T, DetectError>
    where
        T: DeserializeOwned,
    {
        if self.api_token.is_empty() {
            return Err(DetectError::Authentication);
        }

        let url = self.model_url(model);
        tracing::debug!("POST {} ({} base64 chars)", url, base64_image.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&ImageRequest { data: base64_image })
            .send()
            .await?;

        let status = response.status();

        if status == 401 || status == 403 {
            return Err(DetectError::Authentication);
        }

        if status == 429 {
            return Err(DetectError::RateLimitExceeded);
        }

        let body = response.text().await?;

        if !status.is_success() {
            return Err(DetectError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| DetectError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}
