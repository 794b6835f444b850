use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::types::{Quality, ResponseFormat, Size, Style};

/// Errors that can occur during a single image generation call.
#[derive(Debug)]
pub enum ProviderError {
    /// Provider misconfigured (missing API key, bad URL).
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// API returned a non-success status. `message` is the body's
    /// `error.message` when present.
    Api { status: u16, message: String },
    /// Failed to parse the provider's response.
    Parse(String),
    /// Response parsed but carried no usable image payload.
    InvalidPayload,
    /// The generation session was cancelled before the call finished.
    Cancelled,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
            ProviderError::Network(msg) => write!(f, "network error: {msg}"),
            ProviderError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ProviderError::Parse(msg) => write!(f, "parse error: {msg}"),
            ProviderError::InvalidPayload => write!(f, "invalid base64"),
            ProviderError::Cancelled => write!(f, "request was aborted"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Everything a provider needs to produce one image.
///
/// `n` is always 1: batches are built from independent single-image calls.
#[derive(Debug, Clone, Copy)]
pub struct ImageRequest<'a> {
    pub api_key: &'a str,
    pub prompt: &'a str,
    pub model: &'a str,
    pub n: u8,
    pub response_format: ResponseFormat,
    pub size: Size,
    pub style: Style,
    pub quality: Quality,
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Returns the name of the provider.
    fn name(&self) -> &str;

    /// Generates a single image and returns its base64 payload.
    ///
    /// Implementations must return `ProviderError::Cancelled` promptly once
    /// `cancel` fires.
    async fn generate_image(
        &self,
        request: ImageRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError>;
}
