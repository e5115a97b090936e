use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::GenerationSettings;
use crate::errors::ProviderError;
use crate::providers::{http_client, map_send_error, read_json, require_credential, Provider, TextGenerator};

/// DashScope client for Qwen text generation
#[derive(Debug)]
pub struct Qwen {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Full generation endpoint URL
    endpoint: String,
    /// Model, sampling and system prompt used by `generate`
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
}

/// DashScope generation request
#[derive(Debug, Serialize)]
pub struct QwenRequest {
    model: String,
    input: QwenInput,
    parameters: QwenParameters,
}

#[derive(Debug, Serialize)]
struct QwenInput {
    messages: Vec<QwenMessage>,
}

#[derive(Debug, Serialize)]
struct QwenParameters {
    result_format: &'static str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

/// Chat message, shared by request and response
#[derive(Debug, Serialize, Deserialize)]
pub struct QwenMessage {
    pub role: String,
    pub content: String,
}

/// DashScope generation response
#[derive(Debug, Deserialize)]
pub struct QwenResponse {
    pub output: QwenOutput,
}

/// Output block; `text` is set for the plain result format, `choices` for messages
#[derive(Debug, Deserialize)]
pub struct QwenOutput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub choices: Vec<QwenChoice>,
}

#[derive(Debug, Deserialize)]
pub struct QwenChoice {
    pub message: QwenMessage,
}

impl QwenRequest {
    /// Create a new request with a system and a user message
    pub fn new(model: impl Into<String>, system: &str, prompt: &str) -> Self {
        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(QwenMessage { role: "system".to_string(), content: system.to_string() });
        }
        messages.push(QwenMessage { role: "user".to_string(), content: prompt.to_string() });

        Self {
            model: model.into(),
            input: QwenInput { messages },
            parameters: QwenParameters {
                result_format: "message",
                max_tokens: 2000,
                temperature: 0.7,
                top_p: 0.8,
            },
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.parameters.temperature = temperature;
        self
    }

    /// Set the maximum number of tokens to generate
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.parameters.max_tokens = max_tokens;
        self
    }
}

impl Qwen {
    /// Create a new Qwen client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: "qwen-plus".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            system_prompt: String::new(),
        }
    }

    /// Apply model and shared generation settings
    pub fn with_settings(mut self, model: impl Into<String>, settings: &GenerationSettings) -> Self {
        self.model = model.into();
        self.temperature = settings.temperature;
        self.max_tokens = settings.max_tokens;
        self.system_prompt = settings.system_prompt.clone();
        self
    }
}

#[async_trait]
impl Provider for Qwen {
    type Request = QwenRequest;
    type Response = QwenResponse;

    async fn complete(&self, request: QwenRequest) -> Result<QwenResponse, ProviderError> {
        require_credential("Qwen", "API key", &self.api_key)?;

        let response = self.client.post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("Qwen", e))?;

        read_json("Qwen", response).await
    }

    fn extract_text(response: &QwenResponse) -> String {
        response.output.choices
            .first()
            .map(|choice| choice.message.content.clone())
            .or_else(|| response.output.text.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for Qwen {
    fn name(&self) -> &str {
        "Qwen"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = QwenRequest::new(&self.model, &self.system_prompt, prompt)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens);
        let response = self.complete(request).await?;
        Ok(Self::extract_text(&response))
    }
}
