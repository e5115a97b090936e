/*!
 * Tests for application configuration
 */

use std::collections::HashMap;

use anyhow::Result;
use subnarrate::app_config::{Config, LogLevel, ProviderConfig};
use subnarrate::narration::{NarrationStyle, TargetAudience};
use subnarrate::providers::ProviderKind;

/// Test default configuration
#[test]
fn test_default_config_shouldBeValidWithEveryProvider() -> Result<()> {
    let config = Config::default();
    config.validate()?;

    let kinds: Vec<ProviderKind> = config.narration.providers.iter().map(|p| p.kind).collect();
    assert_eq!(kinds, ProviderKind::ALL.to_vec());
    assert_eq!(config.narration.timeout_secs, 120);
    assert_eq!(config.highlights.threshold, 0.6);
    assert_eq!((config.highlights.min_count, config.highlights.max_count), (3, 6));
    assert_eq!(config.frames.vision_model, "qwen-vl-plus");
    Ok(())
}

/// Test partial JSON filling in defaults
#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "narration": {
            "providers": [{ "type": "ollama", "model": "qwen2.5:7b" }, { "type": "openai" }],
            "style": "suspenseful",
            "target_audience": "young"
        },
        "log_level": "debug"
    }"#;
    let config: Config = serde_json::from_str(json)?;
    config.validate()?;

    assert_eq!(config.narration.providers.len(), 2);
    assert_eq!(config.narration.providers[0].kind, ProviderKind::Ollama);
    assert_eq!(config.narration.providers[0].model, "qwen2.5:7b");
    assert_eq!(config.narration.providers[1].kind, ProviderKind::OpenAI);
    assert_eq!(config.narration.style, NarrationStyle::Suspenseful);
    assert_eq!(config.narration.target_audience, TargetAudience::Young);
    assert_eq!(config.narration.max_tokens, 2000);
    assert_eq!(config.segments.default_span_secs, 10.0);
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

/// Test serialization round trip of the written default file
#[test]
fn test_serialize_withDefault_shouldUseTypeKey() -> Result<()> {
    let json = serde_json::to_string_pretty(&Config::default())?;
    assert!(json.contains("\"type\": \"qwen\""));
    assert!(json.contains("\"type\": \"openai\""));

    let back: Config = serde_json::from_str(&json)?;
    assert_eq!(back.narration.providers, Config::default().narration.providers);
    Ok(())
}

/// Test validation failures
#[test]
fn test_validate_withBadValues_shouldFail() {
    let mut config = Config::default();
    config.narration.temperature = 3.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.narration.providers.push(ProviderConfig::new(ProviderKind::Qwen));
    assert!(config.validate().is_err(), "duplicate providers must be rejected");

    let mut config = Config::default();
    config.highlights.min_count = 7;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.highlights.threshold = 1.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.frames.concurrency = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.narration.providers[0].timeout_secs = Some(0);
    assert!(config.validate().is_err());
}

/// Test that an empty cascade is allowed
#[test]
fn test_validate_withNoProviders_shouldSucceed() -> Result<()> {
    let mut config = Config::default();
    config.narration.providers.clear();
    config.validate()
}

/// Test credentials from the environment
#[test]
fn test_apply_env_overrides_withKeys_shouldSetCredentials() {
    let vars: HashMap<&str, &str> = [
        ("DASHSCOPE_API_KEY", "dash-key"),
        ("ERNIE_API_KEY", "ernie-id"),
        ("BAIDU_SECRET_KEY", "ernie-secret"),
        ("OPENAI_API_KEY", "  "),
    ]
    .into_iter()
    .collect();

    let mut config = Config::default();
    let applied = config.apply_env_overrides(|name| vars.get(name).map(|v| v.to_string()));

    let provider = |kind: ProviderKind| {
        config.narration.providers.iter().find(|p| p.kind == kind).cloned().unwrap_or_else(|| ProviderConfig::new(kind))
    };
    assert_eq!(provider(ProviderKind::Qwen).api_key, "dash-key");
    assert_eq!(provider(ProviderKind::Ernie).api_key, "ernie-id");
    assert_eq!(provider(ProviderKind::Ernie).secret_key, "ernie-secret");
    assert!(provider(ProviderKind::OpenAI).api_key.is_empty());
    assert!(config.frames.vision_api_key.is_empty());
    assert_eq!(applied, 3);
}

/// Test the vision key fallback to the Qwen key
#[test]
fn test_apply_env_overrides_withOnlyQwenKey_shouldShareItWithVision() {
    let mut config = Config::default();
    config.apply_env_overrides(|name| (name == "QWEN_API_KEY").then(|| "qwen-key".to_string()));

    assert_eq!(config.narration.providers[0].api_key, "qwen-key");
    assert_eq!(config.frames.vision_api_key, "qwen-key");
}

/// Test derived settings objects
#[test]
fn test_derived_settings_shouldMirrorConfig() {
    let mut config = Config::default();
    config.narration.temperature = 0.2;
    config.highlights.lead_secs = 1.0;

    assert_eq!(config.narration.generation_settings().temperature, 0.2);
    assert_eq!(config.highlights.selection().lead_secs, 1.0);
    assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Info);
}
