//! OpenAI-compatible chat-completion client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::SummarizerConfig;
use crate::error::SummarizationError;

use super::provider::{ChatMessage, ChatProvider};

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// Chat completion response choice message
#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat completion response choice
#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

/// Chat completion usage
#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

/// API error body
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// API error response
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

/// Client for any endpoint speaking the OpenAI chat-completion protocol.
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl OpenAiChatClient {
    /// Create a client from the summarizer configuration.
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummarizationError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SummarizationError::Request(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: completions_endpoint(&config.base_url),
            model: config.model.clone(),
        })
    }
}

/// Append `/chat/completions` to a base URL.
fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[async_trait]
impl ChatProvider for OpenAiChatClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, SummarizationError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizationError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SummarizationError::Request(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or(body);
            return Err(SummarizationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| SummarizationError::Malformed(e.to_string()))?;

        if let Some(usage) = &api_response.usage {
            tracing::debug!(
                model = api_response.model.as_deref().unwrap_or(&self.model),
                input_tokens = usage.prompt_tokens,
                output_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Chat completion usage"
            );
        }

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(SummarizationError::EmptyResponse)
    }
}
