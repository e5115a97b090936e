/*!
 * Highlight selection guided by narration and, optionally, video frames.
 *
 * - `scoring`: importance of a narration line
 * - `frames`: frame sampling, concurrent analysis and key moments
 * - `selector`: candidate ranking and interval construction
 */

pub mod frames;
pub mod scoring;
pub mod selector;

pub use frames::{FrameAnalysis, FrameAnalyzer, FrameSource, KeyMoment};
pub use selector::{trim_to_duration, GuidedHighlightSelector, Highlight, HighlightCandidate, SelectionConfig};
