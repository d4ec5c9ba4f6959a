//! # Chat Completions Client
//!
//! Minimal client for an OpenAI-compatible `/chat/completions` endpoint with
//! strict JSON-schema responses.
//!
//! Handlers depend on the [`CompletionClient`] trait, so tests swap in a fake
//! that returns canned content.

use async_trait::async_trait;
use lib_core::config::LlmSettings;
use lib_core::model::models::TokenCounts;
use lib_core::AppError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

// region: --- Request types

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.into()),
        }
    }

    /// User turn with a prompt and an inline image (`data:` URL).
    pub fn user_with_image(text: impl Into<String>, image_url: String) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: image_url },
                },
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// `response_format` asking for output that matches `schema` exactly.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub json_schema: JsonSchema,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonSchema {
    pub name: &'static str,
    pub strict: bool,
    pub schema: Value,
}

impl ResponseFormat {
    pub fn strict_schema(name: &'static str, schema: Value) -> Self {
        Self {
            kind: "json_schema",
            json_schema: JsonSchema {
                name,
                strict: true,
                schema,
            },
        }
    }
}

// endregion: --- Request types

// region: --- Response types

/// Text of the first choice plus the usage the API reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: TokenCounts,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: i64,
    #[serde(default)]
    completion_tokens: i64,
    #[serde(default)]
    total_tokens: i64,
}

// endregion: --- Response types

// region: --- Error

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not configured")]
    NotConfigured,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Completion returned no content")]
    EmptyResponse,
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured => AppError::Config(err.to_string()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

// endregion: --- Error

/// Anything that can answer a chat-completions request.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError>;
}

/// Client for the OpenAI HTTP API (or any server speaking the same protocol).
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300)) // long statements take a while
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::NotConfigured)?;
        let url = format!("{}/chat/completions", self.base_url);

        debug!("[LLM] POST {} model={}", url, request.model);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let body: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        first_completion(body)
    }
}

fn first_completion(body: ChatCompletionResponse) -> Result<Completion, LlmError> {
    let usage = body.usage.unwrap_or_default();
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)?;

    Ok(Completion {
        content,
        usage: TokenCounts {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_message_shape() {
        let msg = ChatMessage::user_with_image("Read this", "data:image/png;base64,aGk=".into());
        let value = serde_json::to_value(msg).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "user",
                "content": [
                    { "type": "text", "text": "Read this" },
                    { "type": "image_url", "image_url": { "url": "data:image/png;base64,aGk=" } }
                ]
            })
        );
    }

    #[test]
    fn test_strict_schema_shape() {
        let format = ResponseFormat::strict_schema("receipt_response", json!({ "type": "object" }));
        let value = serde_json::to_value(format).unwrap();
        assert_eq!(value["type"], "json_schema");
        assert_eq!(value["json_schema"]["name"], "receipt_response");
        assert_eq!(value["json_schema"]["strict"], true);
    }

    #[test]
    fn test_first_completion() {
        let body: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "{\"merchant\":\"A\"}" } }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        }))
        .unwrap();
        let completion = first_completion(body).unwrap();
        assert_eq!(completion.usage.total_tokens, 15);
        assert!(completion.content.contains("merchant"));
    }

    #[test]
    fn test_empty_choices_rejected() {
        let body: ChatCompletionResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(first_completion(body), Err(LlmError::EmptyResponse)));

        let body: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [{ "message": { "content": "  " } }] })).unwrap();
        assert!(matches!(first_completion(body), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_not_configured_maps_to_config_error() {
        let err: AppError = LlmError::NotConfigured.into();
        assert_eq!(err.code(), "CONFIG");
        let err: AppError = LlmError::EmptyResponse.into();
        assert_eq!(err.code(), "UPSTREAM");
    }
}
