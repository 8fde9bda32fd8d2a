use async_trait::async_trait;

use crate::error::Result;

/// Information about a completion backend
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    /// Human-readable name
    pub name: &'static str,
    /// Whether this backend requires an API key
    pub requires_api_key: bool,
}

/// A single chat-completion call: one system message, one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_message: String,
    pub model: String,
    pub temperature: f32,
    pub json_mode: bool,
}

/// Trait for chat-completion backends
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get information about this backend
    fn info(&self) -> ProviderInfo;

    /// Get the backend name (convenience method)
    fn name(&self) -> &'static str {
        self.info().name
    }

    /// Produce the raw completion text for a request
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
