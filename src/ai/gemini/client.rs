//! Shared transport for the structure, image, and speech clients.
//!
//! Every request this crate makes is a `POST` to
//! `/v1beta/models/{model}:generateContent`, authenticated with the
//! `x-goog-api-key` header. The three clients differ only in the request body
//! they serialize and the per-request timeout they pick.

use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiHttpClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    /// `model` may be given with or without the `models/` prefix. `client` is
    /// shared so all three services reuse one connection pool.
    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Send one `generateContent` request and decode the JSON reply.
    ///
    /// A non-2xx status becomes [`Error::AiProvider`] carrying the status and
    /// body. Connection failures and timeouts surface as [`Error::Http`].
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> Result<Resp> {
        tracing::debug!(
            "generateContent -> {} (timeout {}s)",
            self.model,
            self.timeout.as_secs()
        );

        let response = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Request to {} failed: {}", self.model, e);
                e
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("{} returned status {}: {}", self.model, status, body);
            return Err(Error::AiProvider(format!(
                "Gemini API error (status {}): {}",
                status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Unreadable reply from {}: {}", self.model, e);
            Error::AiProvider(format!("Failed to parse Gemini response: {}", e))
        })
    }
}
