/*!
 * Guided highlight selection.
 *
 * Every narration segment yields a candidate at its midpoint. Candidates are
 * scored, ranked by importance and accepted while they clear the threshold
 * or are still needed to reach the minimum count, up to the maximum count.
 * Accepted candidates become windows around their timestamp, ordered by
 * start time and ranked 1..N in that order. No two windows share a start.
 *
 * With a known video duration, narration starting at or after the end of
 * the video is dropped, the rest is trimmed to it and no window runs past it.
 */

use std::collections::BTreeSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::errors::HighlightError;
use crate::subtitle_processor::TimedSegment;

use super::frames::{nearest_frame, FrameAnalysis};
use super::scoring::importance;

/// A narration moment before selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightCandidate {
    pub timestamp: f64,
    pub narration_text: String,
    /// In `[0, 1]`
    pub importance: f64,
}

/// A selected video interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub start: f64,
    pub end: f64,
    pub importance: f64,
    /// Scene description of the nearest analyzed frame, empty without frames
    pub description: String,
    pub narration: String,
    /// 1-based position by start time
    pub rank: usize,
}

/// Window and cardinality settings for selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Seconds before the candidate timestamp
    pub lead_secs: f64,
    /// Seconds after the candidate timestamp
    pub tail_secs: f64,
    pub threshold: f64,
    pub min_count: usize,
    pub max_count: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            lead_secs: 2.0,
            tail_secs: 3.0,
            threshold: 0.6,
            min_count: 3,
            max_count: 6,
        }
    }
}

/// Picks highlight intervals from narration segments
#[derive(Debug, Clone, Default)]
pub struct GuidedHighlightSelector {
    config: SelectionConfig,
    characters: BTreeSet<String>,
    video_duration: Option<f64>,
}

impl GuidedHighlightSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config, characters: BTreeSet::new(), video_duration: None }
    }

    /// Bound selection to a video of `duration` seconds
    pub fn with_video_duration(mut self, duration: Option<f64>) -> Self {
        self.video_duration = duration.filter(|d| d.is_finite() && *d > 0.0);
        self
    }

    /// Names that earn the character bonus when scoring
    pub fn with_characters(mut self, characters: BTreeSet<String>) -> Self {
        self.characters = characters;
        self
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// One scored candidate per narration segment, at its midpoint
    pub fn candidates(&self, narration_segments: &[TimedSegment]) -> Vec<HighlightCandidate> {
        narration_segments
            .iter()
            .map(|segment| HighlightCandidate {
                timestamp: segment.midpoint(),
                narration_text: segment.text.clone(),
                importance: importance(&segment.text, &self.characters),
            })
            .collect()
    }

    /// Score `narration_segments` and select highlights
    pub fn select(
        &self,
        narration_segments: &[TimedSegment],
        frames: &[FrameAnalysis],
    ) -> Result<Vec<Highlight>, HighlightError> {
        self.select_with_diagnostics(narration_segments, frames).map(|(highlights, _)| highlights)
    }

    /// Select highlights and report narration dropped past the video end
    pub fn select_with_diagnostics(
        &self,
        narration_segments: &[TimedSegment],
        frames: &[FrameAnalysis],
    ) -> Result<(Vec<Highlight>, Vec<Diagnostic>), HighlightError> {
        let (segments, diagnostics) = match self.video_duration {
            Some(duration) => trim_to_duration(narration_segments, duration),
            None => (narration_segments.to_vec(), Vec::new()),
        };
        if segments.is_empty() {
            return Err(HighlightError::NoCandidates);
        }
        let highlights = self.select_candidates(self.candidates(&segments), frames)?;
        Ok((highlights, diagnostics))
    }

    /// Select highlights from already-scored candidates
    pub fn select_candidates(
        &self,
        mut candidates: Vec<HighlightCandidate>,
        frames: &[FrameAnalysis],
    ) -> Result<Vec<Highlight>, HighlightError> {
        if candidates.is_empty() {
            return Err(HighlightError::NoCandidates);
        }

        candidates.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        let max_count = self.config.max_count.max(1);
        let min_count = self.config.min_count.min(max_count);
        let mut highlights: Vec<Highlight> = Vec::new();

        for candidate in &candidates {
            if highlights.len() >= max_count {
                break;
            }
            if candidate.importance >= self.config.threshold || highlights.len() < min_count {
                self.accept(&mut highlights, candidate, frames);
            }
        }

        if highlights.len() < min_count {
            for candidate in &candidates {
                if highlights.len() >= min_count {
                    break;
                }
                self.accept(&mut highlights, candidate, frames);
            }
        }

        highlights.sort_by(|a, b| a.start.total_cmp(&b.start));
        for (position, highlight) in highlights.iter_mut().enumerate() {
            highlight.rank = position + 1;
        }

        info!("Selected {} highlights from {} candidates", highlights.len(), candidates.len());
        Ok(highlights)
    }

    // Push the window for `candidate` unless its start is already taken
    fn accept(&self, accepted: &mut Vec<Highlight>, candidate: &HighlightCandidate, frames: &[FrameAnalysis]) {
        let highlight = self.window(candidate, frames);
        if accepted.iter().any(|h| h.start == highlight.start) {
            debug!("Skipping candidate at {:.1}s, window start {:.1}s already taken", candidate.timestamp, highlight.start);
            return;
        }
        accepted.push(highlight);
    }

    fn window(&self, candidate: &HighlightCandidate, frames: &[FrameAnalysis]) -> Highlight {
        let start = (candidate.timestamp - self.config.lead_secs).max(0.0);
        let mut end = candidate.timestamp + self.config.tail_secs;
        if let Some(duration) = self.video_duration {
            end = end.min(duration).max(start);
        }
        Highlight {
            start,
            end,
            importance: candidate.importance,
            description: nearest_frame(frames, candidate.timestamp)
                .map(|frame| frame.description.clone())
                .unwrap_or_default(),
            narration: candidate.narration_text.clone(),
            rank: 0,
        }
    }
}

/// Drop narration starting at or after `duration` and trim the rest to it
pub fn trim_to_duration(narration_segments: &[TimedSegment], duration: f64) -> (Vec<TimedSegment>, Vec<Diagnostic>) {
    let mut kept = Vec::with_capacity(narration_segments.len());
    let mut diagnostics = Vec::new();

    for segment in narration_segments {
        if segment.start >= duration {
            diagnostics.push(Diagnostic::NarrationPastVideo {
                index: segment.index,
                start: segment.start,
                video_duration: duration,
            });
            continue;
        }
        let mut segment = segment.clone();
        if segment.end > duration {
            segment.set_end(duration);
        }
        kept.push(segment);
    }

    (kept, diagnostics)
}
