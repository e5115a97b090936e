use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::GenerationSettings;
use crate::errors::ProviderError;
use crate::providers::{http_client, map_send_error, Provider, TextGenerator};

// @const: Port Ollama listens on when the endpoint names none
const DEFAULT_PORT: u16 = 11434;

/// Ollama client for interacting with a local Ollama server
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: false,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens to generate
    pub fn num_predict(mut self, num_predict: u32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).num_predict = Some(num_predict);
        self
    }
}

impl Ollama {
    /// Create a new Ollama client; a bare host gets a scheme and the default port
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: normalize_base_url(&endpoint.into()),
            client: http_client(timeout),
            model: "llama3.2:3b".to_string(),
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

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

// @returns: URL with scheme and port, e.g. "localhost" -> "http://localhost:11434"
fn normalize_base_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    let (scheme, rest) = match endpoint.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", endpoint),
    };

    if rest.contains(':') {
        format!("{}://{}", scheme, rest)
    } else {
        format!("{}://{}:{}", scheme, rest, DEFAULT_PORT)
    }
}

// Some Ollama builds ignore `stream: false` and answer with JSON lines.
fn parse_generation_body(body: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(response) = serde_json::from_str::<GenerationResponse>(body) {
        return Ok(response);
    }

    let mut text = String::new();
    let mut done = false;
    let mut parsed_any = false;
    for line in body.lines().filter(|line| !line.trim().is_empty()) {
        if let Ok(chunk) = serde_json::from_str::<GenerationResponse>(line) {
            text.push_str(&chunk.response);
            done |= chunk.done;
            parsed_any = true;
        }
    }

    if !parsed_any {
        let preview: String = body.chars().take(500).collect();
        error!("Failed to parse Ollama API response. Raw response (first 500 chars): {}", preview);
        return Err(ProviderError::ParseError("Ollama response is neither JSON nor JSON lines".to_string()));
    }

    Ok(GenerationResponse { response: text, done })
}

#[async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self.client.post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("Ollama", e))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to read Ollama response: {}", e)))?;

        if !status.is_success() {
            error!("Ollama API error ({}): {}", status, body);
            return Err(ProviderError::ApiError { status_code: status.as_u16(), message: body });
        }

        parse_generation_body(&body)
    }

    fn extract_text(response: &GenerationResponse) -> String {
        response.response.clone()
    }
}

#[async_trait]
impl TextGenerator for Ollama {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut request = GenerationRequest::new(&self.model, prompt)
            .temperature(self.temperature)
            .num_predict(self.max_tokens);
        if !self.system_prompt.is_empty() {
            request = request.system(&self.system_prompt);
        }

        let response = self.complete(request).await?;
        Ok(Self::extract_text(&response))
    }
}
