/*!
 * Prompt construction for narration generation.
 *
 * The prompt embeds a capped excerpt of the subtitles, the content analysis,
 * a tone instruction per style, a register instruction per audience, and a
 * strict `[MM:SS] text` output format so the reply can be parsed back into
 * timed segments.
 */

use crate::analysis::SubtitleAnalysis;
use crate::subtitle_processor::TimedSegment;

use super::request::{NarrationRequest, NarrationStyle, TargetAudience};

/// Default number of subtitle segments embedded in a prompt
pub const DEFAULT_SEGMENT_CAP: usize = 20;

/// Number of key phrases listed in the analysis summary
pub const PROMPT_KEY_PHRASES: usize = 10;

/// System prompt sent to backends that accept one
pub const NARRATOR_SYSTEM_PROMPT: &str =
    "You are a professional video narrator who writes vivid, engaging narration from subtitle content.";

/// Tone instruction per style
pub const STYLE_TONES: [(NarrationStyle, &str); 6] = [
    (NarrationStyle::Professional, "professional and serious; precise wording, steady tone"),
    (NarrationStyle::Humorous, "humorous and witty; add playful comments and comparisons where they fit"),
    (NarrationStyle::Emotional, "emotionally rich; focus on feelings and make the audience feel them"),
    (NarrationStyle::Suspenseful, "suspenseful and tense; build an atmosphere of anticipation"),
    (NarrationStyle::Casual, "relaxed and casual; friendly, natural everyday language"),
    (NarrationStyle::Dramatic, "dramatic; full of tension and expressive flourishes"),
];

/// Register instruction per audience
pub const AUDIENCE_REGISTERS: [(TargetAudience, &str); 4] = [
    (TargetAudience::General, "a general audience"),
    (TargetAudience::Young, "a young audience; keep the language lively"),
    (TargetAudience::Professional, "professionals; use accurate terminology"),
    (TargetAudience::Children, "children; keep the language simple and easy to follow"),
];

/// Tone instruction for `style`
pub fn style_tone(style: NarrationStyle) -> &'static str {
    STYLE_TONES
        .iter()
        .find(|(s, _)| *s == style)
        .map(|(_, tone)| *tone)
        .unwrap_or(STYLE_TONES[0].1)
}

/// Register instruction for `audience`
pub fn audience_register(audience: TargetAudience) -> &'static str {
    AUDIENCE_REGISTERS
        .iter()
        .find(|(a, _)| *a == audience)
        .map(|(_, register)| *register)
        .unwrap_or(AUDIENCE_REGISTERS[0].1)
}

/// Builder for narration prompts
#[derive(Debug, Clone)]
pub struct NarrationPromptBuilder<'a> {
    segments: &'a [TimedSegment],
    analysis: &'a SubtitleAnalysis,
    request: &'a NarrationRequest,
    segment_cap: usize,
    language: String,
}

impl<'a> NarrationPromptBuilder<'a> {
    /// Create a builder over the given inputs
    pub fn new(segments: &'a [TimedSegment], analysis: &'a SubtitleAnalysis, request: &'a NarrationRequest) -> Self {
        Self {
            segments,
            analysis,
            request,
            segment_cap: DEFAULT_SEGMENT_CAP,
            language: "English".to_string(),
        }
    }

    /// Limit how many subtitle segments are embedded
    pub fn segment_cap(mut self, cap: usize) -> Self {
        self.segment_cap = cap.max(1);
        self
    }

    /// Language the narration must be written in
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Render the prompt
    pub fn build(&self) -> String {
        let excerpt = self
            .segments
            .iter()
            .take(self.segment_cap)
            .map(|segment| segment.to_string())
            .collect::<Vec<_>>()
            .join("\n");

        let key_phrases: Vec<&str> = self
            .analysis
            .key_phrases
            .iter()
            .take(PROMPT_KEY_PHRASES)
            .map(String::as_str)
            .collect();

        let mut prompt = String::new();

        match self.request.narrator() {
            Some(name) => {
                prompt.push_str(&format!(
                    "Write narration for the subtitles below as \"{name}\", speaking in the first person.\n\n\
                     Character brief:\n\
                     - You are \"{name}\"\n\
                     - Narrate from your own point of view (I, me, we)\n\
                     - Let your personality and feelings show\n\
                     - You may share your inner thoughts about what happens\n\n"
                ));
            }
            None => {
                prompt.push_str(
                    "Write narration for the subtitles below from an objective, analytical third-person perspective.\n\n",
                );
            }
        }

        prompt.push_str("Subtitle excerpt:\n");
        prompt.push_str(&excerpt);
        prompt.push_str("\n\nContent analysis:\n");
        prompt.push_str(&format!("- Themes: {}\n", list_or_none(self.analysis.themes.iter().map(String::as_str))));
        prompt.push_str(&format!("- Emotions: {}\n", list_or_none(self.analysis.emotions.iter().map(String::as_str))));
        prompt.push_str(&format!("- Characters: {}\n", list_or_none(self.analysis.characters.iter().map(String::as_str))));
        prompt.push_str(&format!("- Key phrases: {}\n\n", list_or_none(key_phrases.into_iter())));

        let perspective = match self.request.narrator() {
            Some(name) => format!("first person, as \"{}\"", name),
            None => "objective third person, an outside observer".to_string(),
        };

        prompt.push_str("Requirements:\n");
        prompt.push_str(&format!("1. Perspective: {}\n", perspective));
        prompt.push_str(&format!("2. Style: {}\n", style_tone(self.request.style)));
        prompt.push_str(&format!("3. Audience: {}\n", audience_register(self.request.target_audience)));
        prompt.push_str(&format!("4. Language: write in fluent, natural {}\n", self.language));
        match self.request.narrator() {
            Some(_) => prompt.push_str("5. Content: follow the subtitles but add the character's own feelings and reading of events\n\n"),
            None => prompt.push_str("5. Content: interpret and analyse the subtitles; explain motives, background and plot development\n\n"),
        }

        prompt.push_str(
            "Output format:\n\
             One narration line per beat, each starting with its timestamp in square brackets:\n\
             [MM:SS] narration text\n\
             Use [HH:MM:SS] for moments past the first hour. Output only these lines.\n\n\
             Notes:\n\
             - Relate to the subtitles without repeating them word for word\n",
        );
        match self.request.narrator() {
            Some(_) => prompt.push_str("- Keep the first-person voice throughout (I think, I see, we)\n"),
            None => prompt.push_str("- Stay neutral and objective\n"),
        }

        prompt
    }
}

fn list_or_none<'s>(items: impl Iterator<Item = &'s str>) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() { "none".to_string() } else { joined }
}
