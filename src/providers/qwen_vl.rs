use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ProviderError;
use crate::highlights::frames::{FrameAnalysis, FrameAnalyzer};
use crate::providers::{http_client, map_send_error, read_json, require_credential};

/// DashScope multimodal endpoint
pub const DEFAULT_ENDPOINT: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/multimodal-generation/generation";

/// Confidence attached to a non-empty Qwen-VL description
const DESCRIPTION_CONFIDENCE: f64 = 0.8;

const DEFAULT_INSTRUCTION: &str =
    "Describe this video frame in detail: the main objects, the setting, and what the people are doing.";

/// Qwen-VL client describing extracted video frames
#[derive(Debug)]
pub struct QwenVl {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    instruction: String,
}

#[derive(Debug, Serialize)]
struct VlRequest {
    model: String,
    input: VlInput,
    parameters: VlParameters,
}

#[derive(Debug, Serialize)]
struct VlInput {
    messages: Vec<VlMessage>,
}

#[derive(Debug, Serialize)]
struct VlMessage {
    role: &'static str,
    content: Vec<VlContent>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum VlContent {
    Image { image: String },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct VlParameters {
    result_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct VlResponse {
    output: VlOutput,
}

#[derive(Debug, Deserialize)]
struct VlOutput {
    #[serde(default)]
    choices: Vec<VlChoice>,
}

#[derive(Debug, Deserialize)]
struct VlChoice {
    message: VlReply,
}

#[derive(Debug, Deserialize)]
struct VlReply {
    content: Value,
}

impl QwenVl {
    /// Create a new Qwen-VL client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        let endpoint = endpoint.into();
        Self {
            client: http_client(timeout),
            api_key: api_key.into(),
            endpoint: if endpoint.trim().is_empty() { DEFAULT_ENDPOINT.to_string() } else { endpoint },
            model: "qwen-vl-plus".to_string(),
            instruction: DEFAULT_INSTRUCTION.to_string(),
        }
    }

    /// Set the model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.model = model;
        }
        self
    }

    /// Set the instruction sent with every frame
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }
}

// The reply content is either a string or a list of {"text": ...} parts.
fn reply_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

#[async_trait]
impl FrameAnalyzer for QwenVl {
    async fn analyze_frame(&self, image_path: &Path, timestamp: f64) -> Result<FrameAnalysis, ProviderError> {
        require_credential("Qwen-VL", "API key", &self.api_key)?;

        let bytes = tokio::fs::read(image_path).await.map_err(|e| {
            ProviderError::RequestFailed(format!("Failed to read frame {:?}: {}", image_path, e))
        })?;
        let image = format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes));

        let request = VlRequest {
            model: self.model.clone(),
            input: VlInput {
                messages: vec![VlMessage {
                    role: "user",
                    content: vec![VlContent::Image { image }, VlContent::Text { text: self.instruction.clone() }],
                }],
            },
            parameters: VlParameters { result_format: "message" },
        };

        let response = self.client.post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("Qwen-VL", e))?;
        let body: VlResponse = read_json("Qwen-VL", response).await?;

        let description = body.output.choices
            .first()
            .map(|choice| reply_text(&choice.message.content))
            .unwrap_or_default()
            .trim()
            .to_string();

        if description.is_empty() {
            return Err(ProviderError::ParseError("Qwen-VL returned no description".to_string()));
        }

        Ok(FrameAnalysis {
            timestamp,
            description,
            confidence: DESCRIPTION_CONFIDENCE,
        })
    }
}
