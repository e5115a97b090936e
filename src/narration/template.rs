/*!
 * Template narration used when every backend has failed.
 *
 * The script is an opening line, one line per content marker (at most
 * three) and a closing line, with evenly spaced timestamps across the
 * transcript. Markers come from the first non-empty source among key
 * moments, themes, key phrases and a fixed set of generic beats, so the
 * script always has at least three lines.
 */

use crate::analysis::SubtitleAnalysis;
use crate::highlights::frames::KeyMoment;
use crate::subtitle_processor::format_clock;

use super::request::{NarrationRequest, NarrationStyle};

/// Content markers used per template script
pub const TEMPLATE_MARKERS: usize = 3;

/// Minimum spacing between template lines
pub const MIN_TEMPLATE_STEP_SECS: f64 = 5.0;

const GENERIC_BEATS: [&str; 3] = ["the setup", "the turning point", "the resolution"];

struct StylePhrases {
    opening: &'static str,
    connective: &'static str,
    closing: &'static str,
}

fn phrases(style: NarrationStyle) -> StylePhrases {
    match style {
        NarrationStyle::Professional => StylePhrases {
            opening: "This video presents a sequence of events worth examining closely.",
            connective: "A key element here is",
            closing: "Taken together, these moments form a coherent and complete account.",
        },
        NarrationStyle::Humorous => StylePhrases {
            opening: "Grab your snacks, because this one has more twists than a pretzel.",
            connective: "And just when you thought it was safe, along comes",
            closing: "And that, folks, is how you make an entrance and an exit.",
        },
        NarrationStyle::Emotional => StylePhrases {
            opening: "Some stories stay with you long after they end, and this is one of them.",
            connective: "It is hard not to be moved by",
            closing: "In the end, what remains is the feeling this story leaves behind.",
        },
        NarrationStyle::Suspenseful => StylePhrases {
            opening: "Something is not quite right here, and it is only the beginning.",
            connective: "Then, without warning, everything turns on",
            closing: "The answers arrive, but the questions linger.",
        },
        NarrationStyle::Casual => StylePhrases {
            opening: "So here is what happens in this one.",
            connective: "Next up, there is",
            closing: "And that pretty much wraps it up.",
        },
        NarrationStyle::Dramatic => StylePhrases {
            opening: "A story unfolds where every moment carries weight.",
            connective: "And now, at the heart of it all, stands",
            closing: "The curtain falls, and nothing will ever be quite the same.",
        },
    }
}

/// Builds template narration scripts
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

impl TemplateNarrator {
    /// Content markers in priority order, at most `TEMPLATE_MARKERS`
    pub fn markers(analysis: &SubtitleAnalysis, key_moments: &[KeyMoment]) -> Vec<String> {
        let from_moments: Vec<String> = key_moments
            .iter()
            .map(|moment| moment.description.trim().to_string())
            .filter(|description| !description.is_empty())
            .take(TEMPLATE_MARKERS)
            .collect();
        if !from_moments.is_empty() {
            return from_moments;
        }

        if !analysis.themes.is_empty() {
            return analysis.themes.iter().take(TEMPLATE_MARKERS).map(|t| format!("a story of {}", t)).collect();
        }

        if !analysis.key_phrases.is_empty() {
            return analysis.key_phrases.iter().take(TEMPLATE_MARKERS).map(|p| format!("\"{}\"", p)).collect();
        }

        GENERIC_BEATS.iter().map(|beat| beat.to_string()).collect()
    }

    /// Render a `[MM:SS] text` script spanning `transcript_end` seconds
    pub fn render(
        analysis: &SubtitleAnalysis,
        request: &NarrationRequest,
        key_moments: &[KeyMoment],
        transcript_end: f64,
    ) -> String {
        let phrases = phrases(request.style);
        let mut lines = Vec::with_capacity(TEMPLATE_MARKERS + 2);

        let opening = match request.narrator() {
            Some(name) => format!("I am {}, and this is my story. {}", name, phrases.opening),
            None => phrases.opening.to_string(),
        };
        lines.push(opening);
        for marker in Self::markers(analysis, key_moments) {
            lines.push(format!("{} {}.", phrases.connective, marker.trim_end_matches('.')));
        }
        lines.push(phrases.closing.to_string());

        let step = (transcript_end.max(0.0) / lines.len() as f64).max(MIN_TEMPLATE_STEP_SECS);
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("[{}] {}", format_clock((i as f64 * step).floor()), line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
