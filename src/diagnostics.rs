/*!
 * Structured diagnostics for recoverable failures.
 *
 * Every stage of the pipeline prefers a partial result over an error. When
 * something is dropped, downgraded or retried, the stage records one of these
 * values next to its output so callers (and tests) can see exactly what
 * happened instead of relying on the log.
 */

use serde::Serialize;

/// Why a subtitle block was left out of the parsed output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Fewer lines than index + timing + text
    TooFewLines,
    /// Timing line did not match the dialect's pattern
    MalformedTiming,
    /// Block had timing but no text
    EmptyText,
    /// ASS `Dialogue:` line with fewer than ten fields
    MalformedDialogue,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DropReason::TooFewLines => "too few lines",
            DropReason::MalformedTiming => "malformed timing line",
            DropReason::EmptyText => "empty text",
            DropReason::MalformedDialogue => "malformed dialogue line",
        };
        f.write_str(label)
    }
}

/// A recoverable problem observed while producing a result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A subtitle block was skipped
    DroppedBlock {
        /// 1-based position of the block in the source file
        block: usize,
        reason: DropReason,
    },
    /// Bytes were not valid UTF-8 and a detected charset (or lossy decode) was used
    LossyDecoding {
        encoding: String,
    },
    /// A narration backend failed or returned nothing
    ProviderFailed {
        provider: String,
        reason: String,
    },
    /// The narration request was invalid and was run in third-person mode
    RequestDowngraded {
        reason: String,
    },
    /// Every backend failed and the template narration was used
    TemplateFallback {
        attempts: usize,
    },
    /// Generated narration starts after the last transcript segment ends
    NarrationPastTranscript {
        index: usize,
        start: f64,
        transcript_end: f64,
    },
    /// A sampled video frame could not be extracted or analyzed
    FrameFailed {
        timestamp: f64,
        reason: String,
    },
    /// The video could not be probed or sampled; highlights carry no frame data
    VideoAnalysisSkipped {
        reason: String,
    },
    /// Narration segment starts at or after the end of the video and was left out of selection
    NarrationPastVideo {
        index: usize,
        start: f64,
        video_duration: f64,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::DroppedBlock { block, reason } => {
                write!(f, "Dropped block {}: {}", block, reason)
            }
            Diagnostic::LossyDecoding { encoding } => {
                write!(f, "Input decoded as {}", encoding)
            }
            Diagnostic::ProviderFailed { provider, reason } => {
                write!(f, "{} failed: {}", provider, reason)
            }
            Diagnostic::RequestDowngraded { reason } => {
                write!(f, "Narration request downgraded to third person: {}", reason)
            }
            Diagnostic::TemplateFallback { attempts } => {
                write!(f, "All {} backends failed, template narration used", attempts)
            }
            Diagnostic::NarrationPastTranscript { index, start, transcript_end } => {
                write!(
                    f,
                    "Narration segment {} starts at {:.1}s, after transcript end {:.1}s",
                    index, start, transcript_end
                )
            }
            Diagnostic::FrameFailed { timestamp, reason } => {
                write!(f, "Frame at {:.1}s failed: {}", timestamp, reason)
            }
            Diagnostic::VideoAnalysisSkipped { reason } => {
                write!(f, "Video analysis skipped: {}", reason)
            }
            Diagnostic::NarrationPastVideo { index, start, video_duration } => {
                write!(
                    f,
                    "Narration segment {} starts at {:.1}s, after video end {:.1}s",
                    index, start, video_duration
                )
            }
        }
    }
}
