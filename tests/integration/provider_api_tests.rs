/*!
 * Integration tests for the provider clients.
 *
 * No test here reaches a real service: clients either fail fast on missing
 * credentials or point at a closed local port.
 */

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use subnarrate::app_config::{Config, GenerationSettings};
use subnarrate::errors::ProviderError;
use subnarrate::highlights::FrameAnalyzer;
use subnarrate::narration::{BackendCascade, NarrationGenerator, NarrationRequest};
use subnarrate::providers::anthropic::Anthropic;
use subnarrate::providers::ernie::{AccessTokenCache, Ernie};
use subnarrate::providers::ollama::Ollama;
use subnarrate::providers::openai::OpenAI;
use subnarrate::providers::qwen::Qwen;
use subnarrate::providers::qwen_vl::QwenVl;
use subnarrate::providers::{build_generators, ProviderKind, TextGenerator};
use subnarrate::subtitle_processor::SubtitleParser;
use crate::common;

const CLOSED_PORT: &str = "http://127.0.0.1:9";

fn short() -> Duration {
    Duration::from_secs(2)
}

/// Test that keyed clients refuse to run without a key
#[tokio::test]
async fn test_generate_withoutApiKeys_shouldFailWithAuthentication() {
    let cache = Arc::new(AccessTokenCache::default());
    let clients: Vec<Box<dyn TextGenerator>> = vec![
        Box::new(Qwen::new("", CLOSED_PORT, short())),
        Box::new(Ernie::new("id-only", "", CLOSED_PORT, short(), cache)),
        Box::new(OpenAI::new(" ", CLOSED_PORT, short())),
        Box::new(Anthropic::new("", CLOSED_PORT, short())),
    ];

    for client in &clients {
        let result = client.generate("Narrate this").await;
        assert!(
            matches!(result, Err(ProviderError::AuthenticationError(_))),
            "{} should fail authentication, got {:?}",
            client.name(),
            result
        );
    }
}

/// Test that an unreachable Ollama server is a connection error
#[tokio::test]
async fn test_ollama_generate_withClosedPort_shouldFailToConnect() {
    let client = Ollama::new(CLOSED_PORT, short()).with_settings("qwen2.5:7b", &GenerationSettings::default());
    let result = client.generate("Narrate this").await;

    assert!(
        matches!(result, Err(ProviderError::ConnectionError(_)) | Err(ProviderError::RequestFailed(_))),
        "unexpected result: {:?}",
        result
    );
}

/// Test that a keyed client with a key fails on transport, not on credentials
#[tokio::test]
async fn test_openai_generate_withKeyAndClosedPort_shouldNotBeAuthentication() {
    let client = OpenAI::new("sk-test", CLOSED_PORT, short());
    let result = client.generate("Narrate this").await;

    assert!(result.is_err());
    assert!(!matches!(result, Err(ProviderError::AuthenticationError(_))));
}

/// Test that ERNIE reuses a cached token instead of asking for a new one
#[tokio::test]
async fn test_ernie_generate_withCachedToken_shouldSkipTokenRequest() {
    let cache = Arc::new(AccessTokenCache::default());
    cache.store("cached-token", Duration::from_secs(3600));

    // The token endpoint is unparsable; using it would fail with RequestFailed
    let client = Ernie::new("id", "secret", CLOSED_PORT, short(), Arc::clone(&cache))
        .with_token_endpoint("not a url");
    let result = client.generate("Narrate this").await;

    assert!(matches!(result, Err(ProviderError::ConnectionError(_))), "unexpected result: {:?}", result);
    assert_eq!(cache.get().as_deref(), Some("cached-token"));
}

/// Test the vision client without a key
#[tokio::test]
async fn test_qwen_vl_analyze_withoutKey_shouldFailWithAuthentication() {
    let client = QwenVl::new("", CLOSED_PORT, short());
    let result = client.analyze_frame(Path::new("/nonexistent/frame.jpg"), 1.0).await;
    assert!(matches!(result, Err(ProviderError::AuthenticationError(_))));
}

/// Test that the default configuration builds one backend per provider, in order
#[test]
fn test_build_generators_withDefaultConfig_shouldKeepOrder() {
    let config = Config::default();
    let cache = Arc::new(AccessTokenCache::default());
    let backends = build_generators(&config.narration.providers, &config.narration.generation_settings(), &cache);

    let names: Vec<&str> = backends.iter().map(|b| b.name()).collect();
    let expected: Vec<&str> = ProviderKind::ALL.iter().map(|k| k.display_name()).collect();
    assert_eq!(names, expected);
}

/// Test the cascade over real, unconfigured clients
#[tokio::test]
async fn test_generate_withUnconfiguredClients_shouldFallBackToTemplate() -> Result<()> {
    let mut config = Config::default();
    for provider in &mut config.narration.providers {
        provider.endpoint = CLOSED_PORT.to_string();
    }
    let cache = Arc::new(AccessTokenCache::default());
    let backends = build_generators(&config.narration.providers, &config.narration.generation_settings(), &cache);
    let generator = NarrationGenerator::new(BackendCascade::new(backends, short()));

    let parsed = SubtitleParser::parse(common::SRT_WITH_ONE_BAD_BLOCK.as_bytes(), "scene.srt")?;
    let analysis = subnarrate::analysis::ContentAnalyzer::analyze(&parsed.segments);
    let result = generator.generate(&parsed.segments, &analysis, &NarrationRequest::default()).await;

    assert!(result.used_template());
    assert!(result.segments.len() >= 3);
    Ok(())
}
