//! OpenAI Images API provider.
//!
//! One call to `POST {base_url}/images/generations` per image. The response
//! carries the image as base64 under `data[0].b64_json`.
//!
//! Every call races the HTTP round trip against the session's cancellation
//! token, so a cancelled batch unwinds without waiting on the network.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::imaging::{
    ImageProvider, ImageRequest, ProviderError, Quality, ResponseFormat, Size, Style,
};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// ============================================================================
// Images API Types
// ============================================================================

/// The request body for the generations endpoint
#[derive(Serialize, Debug)]
struct GenerationsRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    n: u8,
    response_format: ResponseFormat,
    size: Size,
    style: Style,
    quality: Quality,
}

#[derive(Deserialize, Debug)]
struct GenerationsResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize, Debug)]
struct ImageData {
    b64_json: Option<String>,
}

/// `{"error": {"message": "..."}}` as returned on 4xx/5xx
#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    message: String,
}

/// Pulls the human-readable message out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// ============================================================================
// Provider Implementation
// ============================================================================

pub struct OpenAiImageProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiImageProvider {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    async fn request_image(&self, request: ImageRequest<'_>) -> Result<String, ProviderError> {
        if request.api_key.is_empty() {
            return Err(ProviderError::Config("API key is not set".to_string()));
        }

        let body = GenerationsRequest {
            prompt: request.prompt,
            model: request.model,
            n: request.n,
            response_format: request.response_format,
            size: request.size,
            style: request.style,
            quality: request.quality,
        };

        info!(
            "OpenAI image request: model={}, size={}, quality={}, style={}",
            request.model, request.size, request.quality, request.style
        );

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .header("Authorization", format!("Bearer {}", request.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        debug!("OpenAI response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("OpenAI API error: {} - {}", status, err_body);
            return Err(ProviderError::Api {
                status,
                message: error_message(&err_body),
            });
        }

        let parsed: GenerationsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        match parsed.data.into_iter().next().and_then(|d| d.b64_json) {
            Some(b64) if !b64.is_empty() => {
                debug!("Received image payload ({} base64 bytes)", b64.len());
                Ok(b64)
            }
            _ => Err(ProviderError::InvalidPayload),
        }
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate_image(
        &self,
        request: ImageRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Image request aborted by cancellation");
                Err(ProviderError::Cancelled)
            }
            result = self.request_image(request) => result,
        }
    }
}
