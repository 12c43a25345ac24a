// src/core/gemini_client.rs
//! HTTP client for the Gemini generative service

use anyhow::{Context, Result};
use tracing::{error, info, trace};

use crate::environment::GeminiConfig;
use crate::types::gemini::{GenerateContentRequest, GenerateContentResponse};

/// Request/response contract of the generative service.
/// `has_credential` false means the service is unavailable, not broken.
#[rocket::async_trait]
pub trait GenerativeService: Send + Sync {
    fn has_credential(&self) -> bool;

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[rocket::async_trait]
impl GenerativeService for GeminiClient {
    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .context("Gemini API key is not configured")?;
        let url = self.endpoint();

        info!("Calling Gemini model {}", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        let status = response.status();
        trace!("Gemini response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Gemini API error {}: {}", status, error_text);
            anyhow::bail!("Gemini returned error {}: {}", status, error_text);
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .context("Failed to parse Gemini response")
    }
}
