mod openai;
mod rate_limit;
mod traits;

pub use openai::OpenAiProvider;
pub use rate_limit::RateLimiter;
pub use traits::{CompletionProvider, CompletionRequest, ProviderInfo};

use std::num::NonZeroU32;
use std::sync::Arc;

use crate::config::{DEFAULT_RPM, DEFAULT_TEMPERATURE, Endpoint, ProviderConfig, ResolvedProvider};
use crate::error::{Error, Result};

/// Default system instruction when a caller has none
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Per-client call defaults
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub model: String,
    pub temperature: f32,
    pub rpm: NonZeroU32,
    pub json_mode: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            model: Endpoint::default().default_model().unwrap_or_default().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            rpm: DEFAULT_RPM,
            json_mode: false,
        }
    }
}

impl TryFrom<&ResolvedProvider> for ClientSettings {
    type Error = Error;

    fn try_from(provider: &ResolvedProvider) -> Result<Self> {
        let rpm = NonZeroU32::new(provider.rpm).ok_or_else(|| Error::ConfigInvalid {
            field: "rpm".to_string(),
            reason: "must be at least 1 request per minute".to_string(),
        })?;
        Ok(Self {
            model: provider.model.clone(),
            temperature: provider.temperature,
            rpm,
            json_mode: provider.json_mode,
        })
    }
}

/// Per-call overrides of the client defaults
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub json_mode: Option<bool>,
}

/// A configured, rate-limited handle to a completion backend.
///
/// Cloning is cheap; clones share the backend and the rate limiter.
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn CompletionProvider>,
    limiter: Arc<RateLimiter>,
    settings: ClientSettings,
}

impl CompletionClient {
    /// Wrap a backend, throttled by the process-wide limiter.
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: ClientSettings) -> Self {
        Self {
            provider,
            limiter: RateLimiter::global(),
            settings,
        }
    }

    /// Build an OpenAI-compatible client from configuration.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let resolved = config.resolve()?;
        Self::from_resolved(&resolved)
    }

    pub fn from_resolved(resolved: &ResolvedProvider) -> Result<Self> {
        let provider = OpenAiProvider::new(resolved)?;
        tracing::info!(
            "Using {} at {} with model {}",
            resolved.endpoint,
            resolved.base_url,
            resolved.model
        );
        Ok(Self::new(Arc::new(provider), ClientSettings::try_from(resolved)?))
    }

    /// Use an independent rate budget instead of the process-wide one.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Complete with the client defaults.
    pub async fn complete(&self, prompt: &str, system_message: &str) -> Result<String> {
        self.complete_with(prompt, system_message, CallOptions::default())
            .await
    }

    /// Complete with per-call overrides. Every call waits on the rate limiter.
    pub async fn complete_with(
        &self,
        prompt: &str,
        system_message: &str,
        options: CallOptions,
    ) -> Result<String> {
        let request = CompletionRequest {
            prompt: prompt.to_string(),
            system_message: system_message.to_string(),
            model: options.model.unwrap_or_else(|| self.settings.model.clone()),
            temperature: options.temperature.unwrap_or(self.settings.temperature),
            json_mode: options.json_mode.unwrap_or(self.settings.json_mode),
        };

        self.limiter.acquire(self.settings.rpm).await;
        tracing::debug!(
            "Calling {} ({} prompt chars, temperature {})",
            self.provider.name(),
            request.prompt.len(),
            request.temperature
        );
        self.provider.complete(&request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionProvider for RecordingProvider {
        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "recording",
                requires_api_key: false,
            }
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            Ok("ok".to_string())
        }
    }

    fn client(provider: Arc<RecordingProvider>) -> CompletionClient {
        let settings = ClientSettings {
            model: "test-model".into(),
            temperature: 0.3,
            rpm: NonZeroU32::new(60_000).unwrap(),
            json_mode: true,
        };
        CompletionClient::new(provider, settings).with_rate_limiter(Arc::new(RateLimiter::new()))
    }

    #[tokio::test]
    async fn test_defaults_flow_into_request() {
        let provider = Arc::new(RecordingProvider::default());
        let client = client(Arc::clone(&provider));

        client.complete("hi", DEFAULT_SYSTEM_MESSAGE).await.unwrap();

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].model, "test-model");
        assert!(seen[0].json_mode);
        assert_eq!(seen[0].system_message, DEFAULT_SYSTEM_MESSAGE);
    }

    #[tokio::test]
    async fn test_call_options_override_defaults() {
        let provider = Arc::new(RecordingProvider::default());
        let client = client(Arc::clone(&provider));

        let options = CallOptions {
            temperature: Some(0.1),
            json_mode: Some(false),
            ..CallOptions::default()
        };
        client.complete_with("hi", "sys", options).await.unwrap();

        let seen = provider.seen.lock().unwrap();
        assert!((seen[0].temperature - 0.1).abs() < f32::EPSILON);
        assert!(!seen[0].json_mode);
        assert_eq!(seen[0].model, "test-model");
    }

    #[test]
    fn test_defaults_match_provider_config() {
        let settings = ClientSettings::default();
        let config = ProviderConfig::default();
        assert_eq!(settings.rpm.get(), 60);
        assert_eq!(settings.rpm.get(), config.rpm);
        assert!((settings.temperature - config.temperature).abs() < f32::EPSILON);
        assert_eq!(settings.model, "gpt-4o");
    }
}
