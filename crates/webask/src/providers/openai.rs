use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::base::Provider;
use crate::errors::{WebAskError, WebAskResult};
use crate::models::completion::{CompletionRequest, CompletionResponse, TokenUsage};

pub const OPENAI_HOST: &str = "https://api.openai.com";

#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    /// Sent as `OpenAI-Organization` when the key is scoped to an organisation
    pub organization: Option<String>,
}

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> WebAskResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()
            .map_err(|e| WebAskError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> TokenUsage {
        let field = |pointer: &str| data.pointer(pointer).and_then(Value::as_u64).unwrap_or(0);

        TokenUsage::new(
            field("/usage/prompt_tokens"),
            field("/usage/completion_tokens"),
            field("/usage/total_tokens"),
            field("/usage/completion_tokens_details/reasoning_tokens"),
        )
    }

    fn error_message(body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| body.to_string())
    }

    async fn post(&self, payload: Value) -> WebAskResult<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let mut request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload);
        if let Some(organization) = &self.config.organization {
            request = request.header("OpenAI-Organization", organization);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WebAskError::RemoteCallFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WebAskError::RemoteCallFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(WebAskError::RemoteCallFailed(format!(
                "{}: {}",
                status,
                Self::error_message(&body)
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            WebAskError::RemoteCallFailed(format!("Invalid response body: {}", e))
        })
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> WebAskResult<CompletionResponse> {
        // Single choice, no streaming, no output cap and no response format.
        let payload = json!({
            "model": request.model,
            "messages": request.messages,
            "n": 1,
            "temperature": request.temperature,
            "stream": false,
        });

        debug!(model = %request.model, messages = request.messages.len(), "chat completion");
        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            return Err(WebAskError::RemoteCallFailed(format!("OpenAI API error: {}", error)));
        }

        let model = response["model"]
            .as_str()
            .unwrap_or(&request.model)
            .to_string();
        let message = response["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(CompletionResponse {
            model,
            message,
            tokens: Self::get_usage(&response),
        })
    }
}
