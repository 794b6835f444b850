//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::chat::ChatState;
use crate::core::config_state::ConfigState;
use crate::core::persist::Persistence;
use crate::imaging::{ImageProvider, ImageRequest, ProviderError};
use crate::store::MemoryImageStore;

/// A tiny base64 payload that decodes to the PNG signature.
pub const PNG_B64: &str = "iVBORw0KGgo=";

#[derive(Clone)]
enum Outcome {
    Image(String),
    Fail(u16, String),
}

/// What a single scripted call does.
#[derive(Clone)]
pub struct Step {
    outcome: Outcome,
    delay: Duration,
}

impl Step {
    pub fn image(b64: &str, delay: Duration) -> Self {
        Self {
            outcome: Outcome::Image(b64.to_string()),
            delay,
        }
    }

    pub fn fail(status: u16, message: &str, delay: Duration) -> Self {
        Self {
            outcome: Outcome::Fail(status, message.to_string()),
            delay,
        }
    }
}

/// Plays back one step per call, in call order. Calls past the end of the
/// script succeed immediately with [`PNG_B64`].
pub struct ScriptedProvider {
    steps: Vec<Step>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_ok() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_image(
        &self,
        _request: ImageRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .get(index)
            .cloned()
            .unwrap_or_else(|| Step::image(PNG_B64, Duration::ZERO));
        tokio::select! {
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            _ = tokio::time::sleep(step.delay) => {}
        }
        match step.outcome {
            Outcome::Image(b64) => Ok(b64),
            Outcome::Fail(status, message) => Err(ProviderError::Api { status, message }),
        }
    }
}

/// Never finishes on its own; only returns once cancelled.
#[derive(Default)]
pub struct HangingProvider {
    calls: AtomicUsize,
}

impl HangingProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageProvider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn generate_image(
        &self,
        _request: ImageRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        cancel.cancelled().await;
        Err(ProviderError::Cancelled)
    }
}

/// Blows up the batch task.
pub struct PanickingProvider;

#[async_trait]
impl ImageProvider for PanickingProvider {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn generate_image(
        &self,
        _request: ImageRequest<'_>,
        _cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        panic!("provider exploded");
    }
}

/// Creates an in-memory ChatState and hands back its store for inspection.
pub fn test_chat(provider: Arc<dyn ImageProvider>) -> (ChatState, Arc<MemoryImageStore>) {
    test_chat_with(provider, Persistence::ephemeral())
}

pub fn test_chat_with(
    provider: Arc<dyn ImageProvider>,
    persistence: Persistence,
) -> (ChatState, Arc<MemoryImageStore>) {
    let store = Arc::new(MemoryImageStore::new());
    let chat = ChatState::load(provider, store.clone(), persistence, "test-model");
    (chat, store)
}

/// Settings with an API key and the given count.
pub fn configured(count: &str) -> ConfigState {
    let mut config = ConfigState::load(Persistence::ephemeral());
    config.set_api_key("sk-test");
    config.set_count(count);
    config
}
