use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::traits::{CompletionProvider, CompletionRequest, ProviderInfo};
use crate::config::{Endpoint, ResolvedProvider};
use crate::error::{Error, Result};

/// OpenAI-compatible chat-completion backend.
/// Works with: OpenAI, Groq, Gemini's OpenAI surface, TogetherAI, Ollama, llama.cpp, etc.
pub struct OpenAiProvider {
    client: Client,
    /// Which named endpoint this talks to
    pub endpoint: Endpoint,
    /// Base URL for the API (e.g., "https://api.openai.com/v1")
    pub base_url: String,
    /// Optional API key for authentication
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider for an already validated configuration.
    pub fn new(provider: &ResolvedProvider) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::ConfigInvalid {
                field: "http_client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: provider.endpoint,
            base_url: provider.base_url.clone(),
            api_key: provider.api_key.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn body(request: &CompletionRequest) -> ChatRequest<'_> {
        ChatRequest {
            model: &request.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system_message,
                },
                Message {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            top_p: 1.0,
            response_format: request.json_mode.then_some(ResponseFormat { kind: "json_object" }),
        }
    }

    /// Pull the first choice's content out of a response body.
    fn parse_content(body: &str) -> Result<String> {
        let response: ChatResponse =
            serde_json::from_str(body).map_err(|e| Error::ProviderInvalidResponse(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(Error::ProviderEmptyResponse)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.endpoint.name(),
            requires_api_key: self.endpoint.requires_api_key(),
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = self.url();
        debug!("Completion request to {} (model {})", url, request.model);

        let mut req = self.client.post(&url).json(&Self::body(request));
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::ProviderRequest(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::ProviderRequest(e.to_string()))?;

        if !status.is_success() {
            warn!("Completion API error: {} - {}", status, body);
            return Err(Error::ProviderStatus {
                status: status.as_u16(),
                body,
            });
        }

        Self::parse_content(&body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(json_mode: bool) -> CompletionRequest {
        CompletionRequest {
            prompt: "Translate this".into(),
            system_message: "You are a translator.".into(),
            model: "gpt-4o".into(),
            temperature: 0.3,
            json_mode,
        }
    }

    #[test]
    fn test_body_shape() {
        let req = request(false);
        let value = serde_json::to_value(OpenAiProvider::body(&req)).unwrap();
        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["top_p"], 1.0);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "Translate this");
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_body_json_mode() {
        let req = request(true);
        let value = serde_json::to_value(OpenAiProvider::body(&req)).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_parse_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hola"}}]}"#;
        assert_eq!(OpenAiProvider::parse_content(body).unwrap(), "Hola");
    }

    #[test]
    fn test_parse_content_without_choices() {
        let err = OpenAiProvider::parse_content(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, Error::ProviderEmptyResponse));
        assert!(err.is_provider());
    }

    #[test]
    fn test_parse_content_null_content() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert!(matches!(
            OpenAiProvider::parse_content(body),
            Err(Error::ProviderEmptyResponse)
        ));
    }

    #[test]
    fn test_parse_content_garbage() {
        let err = OpenAiProvider::parse_content("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, Error::ProviderInvalidResponse(_)));
    }
}
