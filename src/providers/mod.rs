/*!
 * Text-generation and vision backends.
 *
 * This module contains client implementations for the narration cascade:
 * - Qwen: Alibaba DashScope text generation
 * - Ernie: Baidu ERNIE chat with a cached OAuth access token
 * - OpenAI: OpenAI chat completions (or any compatible server)
 * - Anthropic: Anthropic messages API
 * - Ollama: Local LLM server
 *
 * plus `qwen_vl`, the DashScope multimodal client used to describe frames.
 */

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use log::error;

use crate::app_config::{GenerationSettings, ProviderConfig};
use crate::errors::ProviderError;

pub mod anthropic;
pub mod ernie;
pub mod ollama;
pub mod openai;
pub mod qwen;
pub mod qwen_vl;

/// Common trait for the typed provider clients
///
/// Each client shapes its own request and response; [`TextGenerator`] is the
/// prompt-in, text-out view the cascade works with.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// A backend able to turn a prompt into text, failing with [`ProviderError`]
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    /// Human-readable backend name used in logs and metadata
    fn name(&self) -> &str;

    /// Generate text for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Identity of a narration backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Qwen,
    Ernie,
    #[serde(rename = "openai")]
    OpenAI,
    Anthropic,
    Ollama,
}

/// Static facts about a backend
#[derive(Debug)]
pub struct ProviderInfo {
    /// Name shown in logs and in `service_used`
    pub display_name: &'static str,
    /// Lowercase identifier used in config files and on the command line
    pub id: &'static str,
    /// Whether an API key is required
    pub needs_api_key: bool,
    /// Whether a secret key is required in addition to the API key
    pub needs_secret_key: bool,
    /// Endpoint used when the config leaves it empty
    pub default_endpoint: &'static str,
    /// Model used when the config leaves it empty
    pub default_model: &'static str,
    /// Environment variables consulted for the API key, first match wins
    pub api_key_env: &'static [&'static str],
    /// Environment variables consulted for the secret key
    pub secret_key_env: &'static [&'static str],
}

static PROVIDER_TABLE: [(ProviderKind, ProviderInfo); 5] = [
    (ProviderKind::Qwen, ProviderInfo {
        display_name: "Qwen",
        id: "qwen",
        needs_api_key: true,
        needs_secret_key: false,
        default_endpoint: "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation",
        default_model: "qwen-plus",
        api_key_env: &["QWEN_API_KEY", "DASHSCOPE_API_KEY"],
        secret_key_env: &[],
    }),
    (ProviderKind::Ernie, ProviderInfo {
        display_name: "ERNIE",
        id: "ernie",
        needs_api_key: true,
        needs_secret_key: true,
        default_endpoint: "https://aip.baidubce.com/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/ernie-4.0-8k",
        default_model: "ernie-4.0-8k",
        api_key_env: &["ERNIE_API_KEY", "BAIDU_API_KEY"],
        secret_key_env: &["ERNIE_SECRET_KEY", "BAIDU_SECRET_KEY"],
    }),
    (ProviderKind::OpenAI, ProviderInfo {
        display_name: "OpenAI",
        id: "openai",
        needs_api_key: true,
        needs_secret_key: false,
        default_endpoint: "https://api.openai.com/v1",
        default_model: "gpt-4o-mini",
        api_key_env: &["OPENAI_API_KEY"],
        secret_key_env: &[],
    }),
    (ProviderKind::Anthropic, ProviderInfo {
        display_name: "Anthropic",
        id: "anthropic",
        needs_api_key: true,
        needs_secret_key: false,
        default_endpoint: "https://api.anthropic.com",
        default_model: "claude-3-5-sonnet-latest",
        api_key_env: &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"],
        secret_key_env: &[],
    }),
    (ProviderKind::Ollama, ProviderInfo {
        display_name: "Ollama",
        id: "ollama",
        needs_api_key: false,
        needs_secret_key: false,
        default_endpoint: "http://localhost:11434",
        default_model: "llama3.2:3b",
        api_key_env: &[],
        secret_key_env: &[],
    }),
];

impl ProviderKind {
    /// Every backend, in the default cascade order
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Qwen,
        ProviderKind::Ernie,
        ProviderKind::OpenAI,
        ProviderKind::Anthropic,
        ProviderKind::Ollama,
    ];

    // @returns: Static facts for this backend
    pub fn info(&self) -> &'static ProviderInfo {
        PROVIDER_TABLE
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, info)| info)
            .unwrap_or(&PROVIDER_TABLE[0].1)
    }

    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &'static str {
        self.info().display_name
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.info().id)
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let lowered = s.to_lowercase();
        PROVIDER_TABLE
            .iter()
            .find(|(_, info)| info.id == lowered)
            .map(|(kind, _)| *kind)
            .ok_or_else(|| anyhow::anyhow!("Invalid provider type: {}", s))
    }
}

/// Build the cascade's backends from configuration, keeping config order.
///
/// Backends with missing credentials are still built; they fail fast with an
/// authentication error so the cascade records them and moves on.
pub fn build_generators(
    providers: &[ProviderConfig],
    settings: &GenerationSettings,
    token_cache: &Arc<ernie::AccessTokenCache>,
) -> Vec<Box<dyn TextGenerator>> {
    providers
        .iter()
        .map(|config| -> Box<dyn TextGenerator> {
            let info = config.kind.info();
            let endpoint = non_empty_or(&config.endpoint, info.default_endpoint);
            let model = non_empty_or(&config.model, info.default_model);
            let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(settings.timeout_secs));

            match config.kind {
                ProviderKind::Qwen => Box::new(
                    qwen::Qwen::new(&config.api_key, endpoint, timeout).with_settings(model, settings),
                ),
                ProviderKind::Ernie => Box::new(
                    ernie::Ernie::new(&config.api_key, &config.secret_key, endpoint, timeout, Arc::clone(token_cache))
                        .with_settings(settings),
                ),
                ProviderKind::OpenAI => Box::new(
                    openai::OpenAI::new(&config.api_key, endpoint, timeout).with_settings(model, settings),
                ),
                ProviderKind::Anthropic => Box::new(
                    anthropic::Anthropic::new(&config.api_key, endpoint, timeout).with_settings(model, settings),
                ),
                ProviderKind::Ollama => Box::new(
                    ollama::Ollama::new(endpoint, timeout).with_settings(model, settings),
                ),
            }
        })
        .collect()
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

/// Build a reqwest client with the given timeout
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Map a transport-level reqwest failure to a provider error
pub(crate) fn map_send_error(provider: &str, e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::ConnectionError(format!("{} request timed out: {}", provider, e))
    } else if e.is_connect() {
        ProviderError::ConnectionError(format!("Failed to connect to {}: {}", provider, e))
    } else {
        ProviderError::RequestFailed(format!("Failed to send request to {}: {}", provider, e))
    }
}

/// Check the HTTP status and decode a JSON body
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &str,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("{} API error ({}): {}", provider, status, error_text);

        return Err(match status.as_u16() {
            401 | 403 => ProviderError::AuthenticationError(error_text),
            429 => ProviderError::RateLimitExceeded(error_text),
            code => ProviderError::ApiError { status_code: code, message: error_text },
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::ParseError(format!("{} response: {}", provider, e)))
}

/// Fail fast when a required credential is empty
pub(crate) fn require_credential(provider: &str, label: &str, value: &str) -> Result<(), ProviderError> {
    if value.trim().is_empty() {
        return Err(ProviderError::AuthenticationError(format!(
            "{} {} is not configured",
            provider, label
        )));
    }
    Ok(())
}
