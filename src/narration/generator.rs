/*!
 * Narration generation: prompt, backend cascade, template fallback, parse.
 *
 * `generate` never fails. An invalid request is downgraded to third-person
 * narration, and when every backend fails the template narrator takes over.
 * Each recoverable problem is returned as a [`Diagnostic`] on the result.
 */

use log::{info, warn};
use serde::Serialize;

use crate::analysis::SubtitleAnalysis;
use crate::diagnostics::Diagnostic;
use crate::highlights::frames::KeyMoment;
use crate::progress::{ProgressCallback, report};
use crate::subtitle_processor::{TimedSegment, transcript_end};

use super::cascade::BackendCascade;
use super::prompts::{DEFAULT_SEGMENT_CAP, NarrationPromptBuilder};
use super::request::{NarrationMode, NarrationRequest, NarrationStyle, TargetAudience};
use super::segments::NarrationSegmentParser;
use super::template::TemplateNarrator;

/// `service_used` value when the template narration was used
pub const TEMPLATE_SERVICE: &str = "template";

/// Estimated speaking time per narration character
pub const SPEECH_SECS_PER_CHAR: f64 = 0.5;

/// Facts about a generated narration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrationMetadata {
    pub mode: NarrationMode,
    pub style: NarrationStyle,
    pub target_audience: TargetAudience,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
    pub segment_count: usize,
    /// Characters in the raw narration text
    pub char_count: usize,
    /// Backend display name, or `"template"`
    pub service_used: String,
    pub estimated_speech_secs: f64,
}

/// Narration text, its parsed segments and what happened on the way
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrationResult {
    pub raw_text: String,
    pub segments: Vec<TimedSegment>,
    pub metadata: NarrationMetadata,
    pub diagnostics: Vec<Diagnostic>,
}

impl NarrationResult {
    /// True when the template narration was used
    pub fn used_template(&self) -> bool {
        self.metadata.service_used == TEMPLATE_SERVICE
    }
}

/// Produces narration for a subtitle track
pub struct NarrationGenerator {
    cascade: BackendCascade,
    segment_parser: NarrationSegmentParser,
    segment_cap: usize,
    language: String,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for NarrationGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationGenerator")
            .field("backends", &self.cascade.names())
            .field("segment_parser", &self.segment_parser)
            .field("segment_cap", &self.segment_cap)
            .field("language", &self.language)
            .finish()
    }
}

impl NarrationGenerator {
    /// Create a generator over `cascade`
    pub fn new(cascade: BackendCascade) -> Self {
        Self {
            cascade,
            segment_parser: NarrationSegmentParser::default(),
            segment_cap: DEFAULT_SEGMENT_CAP,
            language: "English".to_string(),
            progress: None,
        }
    }

    /// Use a differently configured segment parser
    pub fn with_segment_parser(mut self, parser: NarrationSegmentParser) -> Self {
        self.segment_parser = parser;
        self
    }

    /// Number of subtitle segments embedded in the prompt
    pub fn with_segment_cap(mut self, cap: usize) -> Self {
        self.segment_cap = cap.max(1);
        self
    }

    /// Output language named in the prompt
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Report progress at coarse milestones
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Generate narration for `segments`
    pub async fn generate(
        &self,
        segments: &[TimedSegment],
        analysis: &SubtitleAnalysis,
        request: &NarrationRequest,
    ) -> NarrationResult {
        self.generate_with_moments(segments, analysis, request, &[]).await
    }

    /// Generate narration, using `key_moments` as template markers if needed
    pub async fn generate_with_moments(
        &self,
        segments: &[TimedSegment],
        analysis: &SubtitleAnalysis,
        request: &NarrationRequest,
        key_moments: &[KeyMoment],
    ) -> NarrationResult {
        self.generate_reporting(segments, analysis, request, key_moments, self.progress.as_ref()).await
    }

    /// Generate narration, reporting milestones to `progress` instead of the configured callback
    pub async fn generate_reporting(
        &self,
        segments: &[TimedSegment],
        analysis: &SubtitleAnalysis,
        request: &NarrationRequest,
        key_moments: &[KeyMoment],
        progress: Option<&ProgressCallback>,
    ) -> NarrationResult {
        let mut diagnostics = Vec::new();
        report(progress, 0.0, "Preparing narration prompt");

        let request = match request.validate() {
            Ok(()) => request.clone(),
            Err(e) => {
                warn!("Invalid narration request, using third person: {}", e);
                diagnostics.push(Diagnostic::RequestDowngraded { reason: e.to_string() });
                request.as_third_person()
            }
        };

        let prompt = NarrationPromptBuilder::new(segments, analysis, &request)
            .segment_cap(self.segment_cap)
            .language(self.language.as_str())
            .build();

        report(progress, 0.2, "Generating narration");
        let outcome = self.cascade.run(&prompt).await;
        diagnostics.extend(outcome.diagnostics);

        let (raw_text, service_used) = match outcome.result {
            Ok(generated) => (generated.text, generated.provider),
            Err(e) => {
                warn!("{}, falling back to template narration", e);
                diagnostics.push(Diagnostic::TemplateFallback { attempts: self.cascade.len() });
                let text = TemplateNarrator::render(analysis, &request, key_moments, transcript_end(segments));
                (text, TEMPLATE_SERVICE.to_string())
            }
        };

        report(progress, 0.8, "Parsing narration segments");
        let (narration_segments, parse_diagnostics) =
            self.segment_parser.parse_with_diagnostics(&raw_text, segments);
        diagnostics.extend(parse_diagnostics);

        let char_count = raw_text.chars().count();
        let metadata = NarrationMetadata {
            mode: request.mode,
            style: request.style,
            target_audience: request.target_audience,
            character_name: request.narrator().map(str::to_string),
            segment_count: narration_segments.len(),
            char_count,
            service_used,
            estimated_speech_secs: char_count as f64 * SPEECH_SECS_PER_CHAR,
        };

        info!(
            "Narration ready: {} segments, {} characters, via {}",
            metadata.segment_count, metadata.char_count, metadata.service_used
        );
        report(progress, 1.0, "Narration complete");

        NarrationResult {
            raw_text,
            segments: narration_segments,
            metadata,
            diagnostics,
        }
    }
}
