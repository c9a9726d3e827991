//! Model provider abstraction and the OpenAI-compatible HTTP implementation

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::LlmConfig;
use crate::MigRagError;
use crate::Result;

/// One message of a chat-completion request
#[derive(Debug, Clone, Serialize)]
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

/// Generated text plus the provider-reported token count
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub content: String,
    pub total_tokens: i64,
}

/// External chat-completion surface consumed by the completion engine
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<ProviderResponse>;
}

/// OpenAI-compatible chat-completions client (DeepSeek uses the same API)
pub struct HttpModelProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpModelProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: i64,
}

#[async_trait]
impl ModelProvider for HttpModelProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<ProviderResponse> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling model provider: {} model={}", url, self.model);

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MigRagError::Provider(format!(
                "provider returned {status}: {body}"
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;

        let content = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                MigRagError::Provider("malformed response: no completion content".to_string())
            })?;

        let total_tokens = completion.usage.map_or(0, |usage| usage.total_tokens);

        Ok(ProviderResponse {
            content,
            total_tokens,
        })
    }
}
