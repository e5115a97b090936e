/*!
 * # subnarrate - subtitle narration and highlight selection
 *
 * A Rust library that turns a subtitle track (and optionally its video) into
 * a timed narration script and a ranked set of highlight intervals.
 *
 * ## Features
 *
 * - Parse SRT, WebVTT, ASS/SSA and plain-text subtitles of unknown encoding
 * - Analyze content: characters, themes, emotions, key phrases, pacing
 * - Generate narration through a cascade of AI providers:
 *   - Qwen (DashScope)
 *   - ERNIE (Baidu, cached OAuth token)
 *   - OpenAI API
 *   - Anthropic API
 *   - Ollama (local LLM)
 * - Fall back to a style-aware template when every provider fails
 * - Select highlight windows guided by narration and analyzed video frames
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `subtitle_processor`: Subtitle decoding and multi-dialect parsing
 * - `analysis`: Content analysis over parsed segments
 * - `narration`: Prompting, backend cascade, template fallback, segment parsing
 * - `highlights`: Importance scoring, frame analysis and selection
 * - `providers`: Client implementations for text and vision backends
 * - `video`: ffprobe/ffmpeg adapters
 * - `app_config`: Configuration management
 * - `app_controller`: Pipeline controller used by the CLI
 * - `file_utils`: File system operations and charset decoding
 * - `diagnostics`: Structured reports of recovered failures
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod analysis;
pub mod app_config;
pub mod app_controller;
pub mod diagnostics;
pub mod errors;
pub mod file_utils;
pub mod highlights;
pub mod narration;
pub mod progress;
pub mod providers;
pub mod subtitle_processor;
pub mod video;

// Re-export main types for easier usage
pub use analysis::{ContentAnalyzer, SubtitleAnalysis};
pub use app_config::Config;
pub use diagnostics::{Diagnostic, DropReason};
pub use errors::{AppError, HighlightError, NarrationError, ProviderError, SubtitleError};
pub use highlights::{FrameAnalysis, GuidedHighlightSelector, Highlight, HighlightCandidate, KeyMoment};
pub use narration::{NarrationGenerator, NarrationRequest, NarrationResult, NarrationSegmentParser};
pub use subtitle_processor::{SubtitleFormat, SubtitleParser, TimedSegment};
