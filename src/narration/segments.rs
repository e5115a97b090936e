/*!
 * Parsing of generated narration text back into timed segments.
 *
 * The primary strategy looks for bracketed markers such as `[01:05]`,
 * `[1:02:03]` or an echoed range `[00:05 - 00:09]` (only the first time is
 * used); each marker's text runs up to the next marker. When the text has no
 * markers at all, every non-blank line gets a fixed slot starting at zero.
 *
 * Both strategies finish with a forward clamp: a segment whose end runs past
 * the next segment's start is shortened to that start. Segments keep source
 * order, so out-of-order markers are not re-sorted.
 */

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::diagnostics::Diagnostic;
use crate::subtitle_processor::{TimedSegment, transcript_end};

/// Span given to each marker-anchored segment
pub const DEFAULT_SEGMENT_SPAN_SECS: f64 = 10.0;

/// Slot length used when the text carries no markers
pub const FALLBACK_SLOT_SECS: f64 = 8.0;

static MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d{1,3}):(\d{2})(?::(\d{2}))?(?:\s*[-–~]\s*[^\]]*)?\]").expect("Invalid narration marker regex")
});

/// Converts raw narration into `TimedSegment`s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrationSegmentParser {
    default_span: f64,
    fallback_slot: f64,
}

impl Default for NarrationSegmentParser {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENT_SPAN_SECS, FALLBACK_SLOT_SECS)
    }
}

impl NarrationSegmentParser {
    /// Create a parser; non-positive values fall back to the defaults
    pub fn new(default_span: f64, fallback_slot: f64) -> Self {
        Self {
            default_span: if default_span > 0.0 { default_span } else { DEFAULT_SEGMENT_SPAN_SECS },
            fallback_slot: if fallback_slot > 0.0 { fallback_slot } else { FALLBACK_SLOT_SECS },
        }
    }

    /// Parse `raw` into segments
    pub fn parse(&self, raw: &str, reference: &[TimedSegment]) -> Vec<TimedSegment> {
        self.parse_with_diagnostics(raw, reference).0
    }

    /// Parse `raw` and report segments that start after the transcript ends
    pub fn parse_with_diagnostics(&self, raw: &str, reference: &[TimedSegment]) -> (Vec<TimedSegment>, Vec<Diagnostic>) {
        let mut segments = self.parse_markers(raw);
        if segments.is_empty() {
            segments = self.parse_lines(raw);
        }

        clamp_forward(&mut segments);
        for (position, segment) in segments.iter_mut().enumerate() {
            segment.index = position + 1;
        }

        let mut diagnostics = Vec::new();
        if !reference.is_empty() {
            let end = transcript_end(reference);
            for segment in segments.iter().filter(|s| s.start > end) {
                debug!("Narration segment {} starts at {:.1}s, after the transcript ends", segment.index, segment.start);
                diagnostics.push(Diagnostic::NarrationPastTranscript {
                    index: segment.index,
                    start: segment.start,
                    transcript_end: end,
                });
            }
        }

        (segments, diagnostics)
    }

    fn parse_markers(&self, raw: &str) -> Vec<TimedSegment> {
        let markers: Vec<(usize, usize, f64)> = MARKER_REGEX
            .captures_iter(raw)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let first: f64 = caps.get(1)?.as_str().parse().ok()?;
                let second: f64 = caps.get(2)?.as_str().parse().ok()?;
                let start = match caps.get(3) {
                    Some(third) => first * 3600.0 + second * 60.0 + third.as_str().parse::<f64>().ok()?,
                    None => first * 60.0 + second,
                };
                Some((whole.start(), whole.end(), start))
            })
            .collect();

        let mut segments = Vec::with_capacity(markers.len());
        for (i, &(_, text_from, start)) in markers.iter().enumerate() {
            let text_to = markers.get(i + 1).map(|next| next.0).unwrap_or(raw.len());
            let text = raw[text_from..text_to].trim();
            if text.is_empty() {
                continue;
            }
            segments.push(TimedSegment::new(0, start, start + self.default_span, text));
        }
        segments
    }

    fn parse_lines(&self, raw: &str) -> Vec<TimedSegment> {
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i, line)| {
                let start = i as f64 * self.fallback_slot;
                TimedSegment::new(0, start, start + self.fallback_slot, line)
            })
            .collect()
    }
}

fn clamp_forward(segments: &mut [TimedSegment]) {
    for i in 0..segments.len().saturating_sub(1) {
        let next_start = segments[i + 1].start;
        if segments[i].end > next_start {
            segments[i].set_end(next_start);
        }
    }
}
