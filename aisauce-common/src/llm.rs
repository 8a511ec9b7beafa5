//! OpenAI-compatible chat completion client
//!
//! Requests JSON-object output and pins sampling temperature to zero: the
//! same input must always give the same answer, otherwise repeated runs
//! produce near-duplicate tags that are hard to find later.

use crate::config::Provider;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("AISauce/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Sampling temperature for every request
pub const TEMPERATURE: f32 = 0.0;

/// Chat completion errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("No API key configured for provider '{0}'")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Completion contained no message content")]
    EmptyResponse,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: &'static str,
}

/// Request body for `POST /chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub response_format: ResponseFormat,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat completion client bound to one provider
pub struct ChatClient {
    http_client: reqwest::Client,
    provider: Provider,
    endpoint: String,
}

impl ChatClient {
    pub fn new(provider: Provider) -> Result<Self, LlmError> {
        if !provider.has_api_key() {
            return Err(LlmError::MissingApiKey(provider.id.clone()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let endpoint = format!(
            "{}/chat/completions",
            provider.api_base_url.trim_end_matches('/')
        );

        Ok(Self {
            http_client,
            provider,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Build the request body without sending it
    pub fn build_request(&self, system_prompt: Option<&str>, user_prompt: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(user_prompt));

        ChatRequest {
            model: self.provider.model.clone(),
            messages,
            stream: false,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            temperature: TEMPERATURE,
        }
    }

    /// Send a JSON-constrained completion and return the raw message content
    pub async fn complete_json(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
    ) -> Result<String, LlmError> {
        let request = self.build_request(system_prompt, user_prompt);

        tracing::debug!(
            provider = %self.provider.id,
            model = %self.provider.model,
            endpoint = %self.endpoint,
            "Requesting chat completion"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.provider.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(status.as_u16(), error_text));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    /// Send a completion and deserialize the content into `T`
    pub async fn structured<T: DeserializeOwned>(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
    ) -> Result<T, LlmError> {
        let content = self.complete_json(system_prompt, user_prompt).await?;
        parse_structured(&content)
    }
}

/// Parse completion content as JSON.
///
/// Some providers wrap JSON-mode output in a markdown code fence anyway, so a
/// surrounding fence is tolerated.
pub fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim()).map_err(|e| LlmError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn provider() -> Provider {
        Provider {
            api_key: "test-key".to_string(),
            api_base_url: "https://llm.example/v1/".to_string(),
            ..Provider::default()
        }
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = ChatClient::new(Provider::default());
        assert!(matches!(result, Err(LlmError::MissingApiKey(_))));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = ChatClient::new(provider()).unwrap();
        assert_eq!(client.endpoint(), "https://llm.example/v1/chat/completions");
    }

    #[test]
    fn test_request_is_deterministic_json_mode() {
        let client = ChatClient::new(provider()).unwrap();
        let request = client.build_request(Some("sys"), "user");
        let body: Value = serde_json::to_value(&request).unwrap();

        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["stream"], false);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "user");
    }

    #[test]
    fn test_request_without_system_prompt() {
        let client = ChatClient::new(provider()).unwrap();
        let request = client.build_request(None, "only user");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
    }

    #[test]
    fn test_parse_structured_plain_and_fenced() {
        let plain: Value = parse_structured(r#"{"title": "A"}"#).unwrap();
        assert_eq!(plain["title"], "A");

        let fenced: Value = parse_structured("```json\n{\"title\": \"B\"}\n```").unwrap();
        assert_eq!(fenced["title"], "B");
    }

    #[test]
    fn test_parse_structured_rejects_prose() {
        let result: Result<Value, _> = parse_structured("Sure! Here is the metadata.");
        assert!(matches!(result, Err(LlmError::ParseError(_))));
    }
}
