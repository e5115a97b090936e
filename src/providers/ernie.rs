/*!
 * Baidu ERNIE chat client.
 *
 * ERNIE authenticates with a short-lived OAuth access token obtained from an
 * API key / secret key pair. The token lives in an [`AccessTokenCache`] that is
 * owned by the caller and shared between clients, so repeated narrations reuse
 * it until shortly before it expires.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app_config::GenerationSettings;
use crate::errors::ProviderError;
use crate::providers::{http_client, map_send_error, read_json, require_credential, Provider, TextGenerator};

/// OAuth endpoint issuing ERNIE access tokens
pub const TOKEN_ENDPOINT: &str = "https://aip.baidubce.com/oauth/2.0/token";

/// Tokens are refreshed this long before they actually expire
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(300);

// ERNIE error codes meaning the access token is invalid or expired
const TOKEN_ERROR_CODES: [i64; 3] = [110, 111, 18];

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Expiring access-token holder with check-and-refresh semantics.
///
/// Concurrent callers that both see a stale token will both refresh; the last
/// store wins. No lock is held across the refresh request.
#[derive(Debug)]
pub struct AccessTokenCache {
    state: Mutex<Option<CachedToken>>,
    refresh_margin: Duration,
}

impl Default for AccessTokenCache {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_MARGIN)
    }
}

impl AccessTokenCache {
    /// Create an empty cache
    pub fn new(refresh_margin: Duration) -> Self {
        Self {
            state: Mutex::new(None),
            refresh_margin,
        }
    }

    /// Current token, if one is stored and not yet inside the refresh margin
    pub fn get(&self) -> Option<String> {
        let state = self.state.lock();
        state
            .as_ref()
            .filter(|cached| Instant::now() < cached.refresh_at)
            .map(|cached| cached.token.clone())
    }

    /// Store a token valid for `expires_in`
    pub fn store(&self, token: impl Into<String>, expires_in: Duration) {
        let refresh_at = Instant::now() + expires_in.saturating_sub(self.refresh_margin);
        *self.state.lock() = Some(CachedToken { token: token.into(), refresh_at });
    }

    /// Forget the stored token
    pub fn invalidate(&self) {
        *self.state.lock() = None;
    }

    /// Return the cached token, or run `refresh` and cache its result
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<String, ProviderError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(String, Duration), ProviderError>>,
    {
        if let Some(token) = self.get() {
            return Ok(token);
        }

        let (token, expires_in) = refresh().await?;
        self.store(token.clone(), expires_in);
        Ok(token)
    }
}

/// ERNIE chat client
#[derive(Debug)]
pub struct Ernie {
    client: Client,
    api_key: String,
    secret_key: String,
    endpoint: String,
    token_endpoint: String,
    token_cache: Arc<AccessTokenCache>,
    temperature: f32,
    max_output_tokens: u32,
    system_prompt: String,
}

/// ERNIE chat request
#[derive(Debug, Serialize)]
pub struct ErnieRequest {
    messages: Vec<ErnieMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ErnieMessage {
    role: &'static str,
    content: String,
}

/// ERNIE chat response; errors come back with HTTP 200 and an error code
#[derive(Debug, Deserialize)]
pub struct ErnieResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
    #[serde(default)]
    error_description: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

impl ErnieRequest {
    /// Create a request with a single user message
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ErnieMessage { role: "user", content: prompt.into() }],
            system: None,
            temperature: 0.7,
            top_p: 0.8,
            max_output_tokens: 2000,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        let system = system.into();
        self.system = (!system.is_empty()).then_some(system);
        self
    }

    /// Set the temperature (ERNIE accepts (0, 1])
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.01, 1.0);
        self
    }

    /// Set the output token budget
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }
}

impl Ernie {
    /// Create a new ERNIE client sharing `token_cache`
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
        token_cache: Arc<AccessTokenCache>,
    ) -> Self {
        Self {
            client: http_client(timeout),
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            endpoint: endpoint.into(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            token_cache,
            temperature: 0.7,
            max_output_tokens: 2000,
            system_prompt: String::new(),
        }
    }

    /// Apply shared generation settings
    pub fn with_settings(mut self, settings: &GenerationSettings) -> Self {
        self.temperature = settings.temperature;
        self.max_output_tokens = settings.max_tokens;
        self.system_prompt = settings.system_prompt.clone();
        self
    }

    /// Override the OAuth endpoint
    pub fn with_token_endpoint(mut self, token_endpoint: impl Into<String>) -> Self {
        self.token_endpoint = token_endpoint.into();
        self
    }

    async fn fetch_token(&self) -> Result<(String, Duration), ProviderError> {
        let url = Url::parse_with_params(
            &self.token_endpoint,
            &[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.secret_key.as_str()),
            ],
        )
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid ERNIE token endpoint: {}", e)))?;

        let response = self.client.post(url)
            .send()
            .await
            .map_err(|e| map_send_error("ERNIE", e))?;
        let token: TokenResponse = read_json("ERNIE", response).await?;

        match token.access_token {
            Some(access_token) => {
                debug!("Obtained ERNIE access token valid for {}s", token.expires_in);
                Ok((access_token, Duration::from_secs(token.expires_in)))
            }
            None => Err(ProviderError::AuthenticationError(
                token.error_description.unwrap_or_else(|| "no access_token in response".to_string()),
            )),
        }
    }
}

#[async_trait]
impl Provider for Ernie {
    type Request = ErnieRequest;
    type Response = ErnieResponse;

    async fn complete(&self, request: ErnieRequest) -> Result<ErnieResponse, ProviderError> {
        require_credential("ERNIE", "API key", &self.api_key)?;
        require_credential("ERNIE", "secret key", &self.secret_key)?;

        let token = self.token_cache.get_or_refresh(|| self.fetch_token()).await?;

        let url = Url::parse_with_params(&self.endpoint, &[("access_token", token.as_str())])
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid ERNIE endpoint: {}", e)))?;

        let response = self.client.post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("ERNIE", e))?;
        let body: ErnieResponse = read_json("ERNIE", response).await?;

        if let Some(code) = body.error_code {
            let message = body.error_msg.unwrap_or_default();
            if TOKEN_ERROR_CODES.contains(&code) {
                self.token_cache.invalidate();
                return Err(ProviderError::AuthenticationError(format!("{} ({})", message, code)));
            }
            return Err(ProviderError::ApiError { status_code: 200, message: format!("{} ({})", message, code) });
        }

        Ok(body)
    }

    fn extract_text(response: &ErnieResponse) -> String {
        response.result.clone().unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for Ernie {
    fn name(&self) -> &str {
        "ERNIE"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ErnieRequest::new(prompt)
            .system(self.system_prompt.as_str())
            .temperature(self.temperature)
            .max_output_tokens(self.max_output_tokens);
        let response = self.complete(request).await?;
        Ok(Self::extract_text(&response))
    }
}
