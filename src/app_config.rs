use anyhow::{anyhow, Result};
use log::{debug, LevelFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::default::Default;

use crate::highlights::SelectionConfig;
use crate::narration::prompts::{DEFAULT_SEGMENT_CAP, NARRATOR_SYSTEM_PROMPT};
use crate::narration::{NarrationSegmentParser, NarrationStyle, TargetAudience};
use crate::providers::ProviderKind;

/// Application configuration module
/// This module handles loading defaults, environment overrides and
/// validation of the pipeline settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Narration generation settings
    #[serde(default)]
    pub narration: NarrationConfig,

    /// Narration segment parsing settings
    #[serde(default)]
    pub segments: SegmentConfig,

    /// Highlight selection settings
    #[serde(default)]
    pub highlights: HighlightConfig,

    /// Video frame analysis settings
    #[serde(default)]
    pub frames: FrameConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// One entry of the narration cascade
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: Provider identity
    #[serde(rename = "type")]
    pub kind: ProviderKind,

    // @field: Model name, empty for the provider default
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key (or ERNIE client id)
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: ERNIE client secret
    #[serde(default = "String::new")]
    pub secret_key: String,

    // @field: Service URL, empty for the provider default
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Per-provider timeout overriding narration.timeout_secs
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    // @param kind: Provider enum
    // @returns: Provider config with defaults
    pub fn new(kind: ProviderKind) -> Self {
        let info = kind.info();
        Self {
            kind,
            model: info.default_model.to_string(),
            api_key: String::new(),
            secret_key: String::new(),
            endpoint: info.default_endpoint.to_string(),
            timeout_secs: None,
        }
    }
}

/// Narration generation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NarrationConfig {
    /// Backends in cascade priority order
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature parameter for text generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per narration
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Language the narration is written in
    #[serde(default = "default_language")]
    pub language: String,

    /// Subtitle segments embedded in the prompt
    #[serde(default = "default_prompt_segment_cap")]
    pub prompt_segment_cap: usize,

    /// System prompt for backends that accept one
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Default narration style
    #[serde(default)]
    pub style: NarrationStyle,

    /// Default target audience
    #[serde(default)]
    pub target_audience: TargetAudience,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            language: default_language(),
            prompt_segment_cap: default_prompt_segment_cap(),
            system_prompt: default_system_prompt(),
            style: NarrationStyle::default(),
            target_audience: TargetAudience::default(),
        }
    }
}

impl NarrationConfig {
    /// Settings shared by every backend
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout_secs,
            system_prompt: self.system_prompt.clone(),
        }
    }
}

/// Generation parameters handed to each backend client
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub system_prompt: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        NarrationConfig::default().generation_settings()
    }
}

/// Narration segment parsing configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SegmentConfig {
    /// Span of a marker-anchored segment in seconds
    #[serde(default = "default_span_secs")]
    pub default_span_secs: f64,

    /// Slot per line when the narration has no markers
    #[serde(default = "default_fallback_slot_secs")]
    pub fallback_slot_secs: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            default_span_secs: default_span_secs(),
            fallback_slot_secs: default_fallback_slot_secs(),
        }
    }
}

impl SegmentConfig {
    pub fn parser(&self) -> NarrationSegmentParser {
        NarrationSegmentParser::new(self.default_span_secs, self.fallback_slot_secs)
    }
}

/// Highlight selection configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HighlightConfig {
    /// Seconds kept before each highlight timestamp
    #[serde(default = "default_lead_secs")]
    pub lead_secs: f64,

    /// Seconds kept after each highlight timestamp
    #[serde(default = "default_tail_secs")]
    pub tail_secs: f64,

    /// Importance needed to be accepted outright
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Highlights guaranteed when enough candidates exist
    #[serde(default = "default_min_count")]
    pub min_count: usize,

    /// Upper bound on highlights
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            lead_secs: default_lead_secs(),
            tail_secs: default_tail_secs(),
            threshold: default_threshold(),
            min_count: default_min_count(),
            max_count: default_max_count(),
        }
    }
}

impl HighlightConfig {
    pub fn selection(&self) -> SelectionConfig {
        SelectionConfig {
            lead_secs: self.lead_secs,
            tail_secs: self.tail_secs,
            threshold: self.threshold,
            min_count: self.min_count,
            max_count: self.max_count,
        }
    }
}

/// Video frame analysis configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FrameConfig {
    /// Frames analyzed at the same time
    #[serde(default = "default_frame_concurrency")]
    pub concurrency: usize,

    /// ffprobe timeout in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// ffmpeg timeout per frame in seconds
    #[serde(default = "default_extract_timeout_secs")]
    pub extract_timeout_secs: u64,

    /// Vision request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub vision_timeout_secs: u64,

    /// Qwen-VL API key
    #[serde(default = "String::new")]
    pub vision_api_key: String,

    /// Qwen-VL endpoint, empty for the default
    #[serde(default = "String::new")]
    pub vision_endpoint: String,

    /// Qwen-VL model
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            concurrency: default_frame_concurrency(),
            probe_timeout_secs: default_probe_timeout_secs(),
            extract_timeout_secs: default_extract_timeout_secs(),
            vision_timeout_secs: default_timeout_secs(),
            vision_api_key: String::new(),
            vision_endpoint: String::new(),
            vision_model: default_vision_model(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

const VISION_API_KEY_ENV: [&str; 2] = ["QWEN_VL_API_KEY", "QWEN_API_KEY"];

fn default_providers() -> Vec<ProviderConfig> {
    ProviderKind::ALL.into_iter().map(ProviderConfig::new).collect()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_language() -> String {
    "English".to_string()
}

fn default_prompt_segment_cap() -> usize {
    DEFAULT_SEGMENT_CAP
}

fn default_system_prompt() -> String {
    NARRATOR_SYSTEM_PROMPT.to_string()
}

fn default_span_secs() -> f64 {
    10.0
}

fn default_fallback_slot_secs() -> f64 {
    8.0
}

fn default_lead_secs() -> f64 {
    2.0
}

fn default_tail_secs() -> f64 {
    3.0
}

fn default_threshold() -> f64 {
    0.6
}

fn default_min_count() -> usize {
    3
}

fn default_max_count() -> usize {
    6
}

fn default_frame_concurrency() -> usize {
    4
}

fn default_probe_timeout_secs() -> u64 {
    60
}

fn default_extract_timeout_secs() -> u64 {
    30
}

fn default_vision_model() -> String {
    "qwen-vl-plus".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let narration = &self.narration;
        if narration.timeout_secs == 0 {
            return Err(anyhow!("narration.timeout_secs must be greater than zero"));
        }
        if !(0.0..=2.0).contains(&narration.temperature) {
            return Err(anyhow!("narration.temperature must be between 0.0 and 2.0, got {}", narration.temperature));
        }
        if narration.max_tokens == 0 {
            return Err(anyhow!("narration.max_tokens must be greater than zero"));
        }
        if narration.prompt_segment_cap == 0 {
            return Err(anyhow!("narration.prompt_segment_cap must be greater than zero"));
        }

        let mut seen = HashSet::new();
        for provider in &narration.providers {
            if !seen.insert(provider.kind) {
                return Err(anyhow!("Provider '{}' is listed more than once", provider.kind));
            }
            if provider.timeout_secs == Some(0) {
                return Err(anyhow!("Provider '{}' timeout_secs must be greater than zero", provider.kind));
            }
        }

        if self.segments.default_span_secs <= 0.0 || self.segments.fallback_slot_secs <= 0.0 {
            return Err(anyhow!("Segment span and fallback slot must be positive"));
        }

        let highlights = &self.highlights;
        if highlights.lead_secs < 0.0 || highlights.tail_secs < 0.0 {
            return Err(anyhow!("Highlight window offsets must not be negative"));
        }
        if !(0.0..=1.0).contains(&highlights.threshold) {
            return Err(anyhow!("highlights.threshold must be between 0.0 and 1.0"));
        }
        if highlights.max_count == 0 || highlights.min_count > highlights.max_count {
            return Err(anyhow!(
                "Highlight counts must satisfy 0 < min_count <= max_count, got min {} max {}",
                highlights.min_count, highlights.max_count
            ));
        }

        if self.frames.concurrency == 0 {
            return Err(anyhow!("frames.concurrency must be greater than zero"));
        }

        Ok(())
    }

    /// Replace credentials with values found through `lookup`.
    ///
    /// `lookup` is normally `std::env::var(..).ok()`; the first non-empty
    /// variable listed for a provider wins. Returns how many values were set.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> usize
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names.iter().find_map(|name| lookup(name).filter(|value| !value.trim().is_empty()))
        };
        let mut applied = 0;

        for provider in &mut self.narration.providers {
            let info = provider.kind.info();
            if let Some(key) = first(info.api_key_env) {
                debug!("Using API key for {} from the environment", info.display_name);
                provider.api_key = key;
                applied += 1;
            }
            if let Some(secret) = first(info.secret_key_env) {
                provider.secret_key = secret;
                applied += 1;
            }
        }

        if let Some(key) = first(&VISION_API_KEY_ENV) {
            debug!("Using Qwen-VL API key from the environment");
            self.frames.vision_api_key = key;
            applied += 1;
        }

        applied
    }
}
