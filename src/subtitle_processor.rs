use std::fmt;
use std::path::Path;
use regex::Regex;
use once_cell::sync::Lazy;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, DropReason};
use crate::errors::SubtitleError;
use crate::file_utils::FileManager;

// @module: Subtitle decoding and multi-dialect parsing

// @const: SRT/VTT cue timing line, hours optional, settings after the end time ignored
static CUE_TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:\d+:)?\d{1,2}:\d{2}[,.]\d{1,3})\s*-->\s*((?:\d+:)?\d{1,2}:\d{2}[,.]\d{1,3})")
        .expect("valid cue timing regex")
});

// @const: Single clock value: [H+:]MM:SS[,.]fraction
static CLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d{1,2}):(\d{1,2})(?:[,.](\d{1,3}))?$").expect("valid clock regex")
});

// @const: ASS override blocks such as {\i1} or {\pos(10,20)}
static ASS_OVERRIDE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^}]*\}").expect("valid override regex")
});

// @const: Blank-line block separator tolerant of trailing spaces
static BLOCK_SEPARATOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n[ \t]*\n").expect("valid separator regex")
});

// @const: Span given to each plain-text line
pub const PLAIN_TEXT_SPAN_SECS: f64 = 5.0;

// @struct: Contiguous span of time with its text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSegment {
    // @field: 1-based position in the output list
    pub index: usize,

    // @field: Start in seconds
    pub start: f64,

    // @field: End in seconds, never before start
    pub end: f64,

    // @field: Segment text
    pub text: String,

    // @field: end - start, always recomputed
    pub duration: f64,
}

impl TimedSegment {
    // @creates: Segment with end clamped to start and duration derived
    pub fn new(index: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        let start = start.max(0.0);
        let end = end.max(start);
        Self {
            index,
            start,
            end,
            text: text.into(),
            duration: end - start,
        }
    }

    // @mutates: End time, keeping end >= start and duration in sync
    pub fn set_end(&mut self, end: f64) {
        self.end = end.max(self.start);
        self.duration = self.end - self.start;
    }

    // @returns: Midpoint of the span
    pub fn midpoint(&self) -> f64 {
        self.start + self.duration / 2.0
    }
}

impl fmt::Display for TimedSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{} - {}] {}", format_clock(self.start), format_clock(self.end), self.text)
    }
}

/// Subtitle dialects understood by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Srt,
    Vtt,
    Ass,
    #[serde(rename = "txt")]
    PlainText,
}

impl SubtitleFormat {
    // @returns: Format for a known extension, case-insensitive
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "srt" => Some(Self::Srt),
            "vtt" => Some(Self::Vtt),
            "ass" | "ssa" => Some(Self::Ass),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    // @returns: Format guessed from content, used when the filename has no extension
    pub fn sniff(text: &str) -> Option<Self> {
        let head = text.trim_start_matches('\u{feff}').trim_start();
        if head.starts_with("WEBVTT") {
            return Some(Self::Vtt);
        }
        if head.contains("[Script Info]") || head.contains("[Events]") {
            return Some(Self::Ass);
        }
        if text.lines().any(|line| CUE_TIMING_REGEX.is_match(line)) {
            return Some(Self::Srt);
        }
        None
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Ass => "ass",
            Self::PlainText => "txt",
        };
        f.write_str(name)
    }
}

/// Output of a parse: segments in source order plus what was dropped
#[derive(Debug, Clone)]
pub struct ParsedSubtitle {
    /// Segments, indexed 1..N by output position
    pub segments: Vec<TimedSegment>,
    /// Dialect the bytes were parsed as
    pub format: SubtitleFormat,
    /// Encoding used to decode the bytes
    pub encoding: &'static str,
    /// Recoverable problems encountered while parsing
    pub diagnostics: Vec<Diagnostic>,
}

// @struct: Multi-dialect subtitle parser
pub struct SubtitleParser;

impl SubtitleParser {
    /// Decode and parse raw subtitle bytes.
    ///
    /// The dialect comes from the filename's extension; a filename without an
    /// extension is sniffed from its content. Malformed blocks are dropped and
    /// reported in `diagnostics`, so an empty segment list is not an error here.
    pub fn parse(raw: &[u8], filename: &str) -> Result<ParsedSubtitle, SubtitleError> {
        let extension = Path::new(filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_string());

        let declared = match &extension {
            Some(ext) => Some(SubtitleFormat::from_extension(ext).ok_or_else(|| {
                SubtitleError::UnsupportedFormat(format!("extension '.{}' of {}", ext, filename))
            })?),
            None => None,
        };

        let decoded = FileManager::decode_bytes(raw)?;

        let format = match declared {
            Some(format) => format,
            None => SubtitleFormat::sniff(&decoded.text).ok_or_else(|| {
                SubtitleError::UnsupportedFormat(format!("unrecognised content in {}", filename))
            })?,
        };

        let (segments, mut diagnostics) = Self::parse_text(&decoded.text, format);

        if decoded.lossy {
            diagnostics.insert(0, Diagnostic::LossyDecoding { encoding: decoded.encoding.to_string() });
        }

        debug!(
            "Parsed {} as {}: {} segments, {} diagnostics",
            filename, format, segments.len(), diagnostics.len()
        );

        Ok(ParsedSubtitle {
            segments,
            format,
            encoding: decoded.encoding,
            diagnostics,
        })
    }

    /// Parse already-decoded text in the given dialect
    pub fn parse_text(text: &str, format: SubtitleFormat) -> (Vec<TimedSegment>, Vec<Diagnostic>) {
        let normalized = text.trim_start_matches('\u{feff}').replace("\r\n", "\n").replace('\r', "\n");

        let (mut segments, diagnostics) = match format {
            SubtitleFormat::Srt => Self::parse_srt(&normalized),
            SubtitleFormat::Vtt => Self::parse_vtt(&normalized),
            SubtitleFormat::Ass => Self::parse_ass(&normalized),
            SubtitleFormat::PlainText => (Self::parse_plain_text(&normalized), Vec::new()),
        };

        for (position, segment) in segments.iter_mut().enumerate() {
            segment.index = position + 1;
        }

        for diagnostic in &diagnostics {
            debug!("{}", diagnostic);
        }

        (segments, diagnostics)
    }

    fn split_blocks(text: &str) -> Vec<&str> {
        BLOCK_SEPARATOR_REGEX
            .split(text)
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .collect()
    }

    // @parses: SRT blocks of index, timing line, text lines
    fn parse_srt(text: &str) -> (Vec<TimedSegment>, Vec<Diagnostic>) {
        let mut segments = Vec::new();
        let mut diagnostics = Vec::new();

        for (position, block) in Self::split_blocks(text).into_iter().enumerate() {
            let lines: Vec<&str> = block.lines().collect();
            let block_no = position + 1;

            if lines.len() < 3 {
                diagnostics.push(Diagnostic::DroppedBlock { block: block_no, reason: DropReason::TooFewLines });
                continue;
            }

            match Self::cue_from_lines(lines[1], &lines[2..]) {
                Ok(segment) => segments.push(segment),
                Err(reason) => diagnostics.push(Diagnostic::DroppedBlock { block: block_no, reason }),
            }
        }

        (segments, diagnostics)
    }

    // @parses: WebVTT cues; header, NOTE, STYLE and REGION blocks are skipped
    fn parse_vtt(text: &str) -> (Vec<TimedSegment>, Vec<Diagnostic>) {
        let mut segments = Vec::new();
        let mut diagnostics = Vec::new();

        let mut blocks = Self::split_blocks(text);
        if blocks.first().is_some_and(|first| first.starts_with("WEBVTT")) {
            blocks.remove(0);
        }

        for (position, block) in blocks.into_iter().enumerate() {
            let block_no = position + 1;
            if ["NOTE", "STYLE", "REGION"].iter().any(|kw| block.starts_with(kw)) {
                continue;
            }

            let lines: Vec<&str> = block.lines().collect();
            let timing_at = if lines[0].contains("-->") { 0 } else { 1 };

            if lines.len() < timing_at + 2 {
                diagnostics.push(Diagnostic::DroppedBlock { block: block_no, reason: DropReason::TooFewLines });
                continue;
            }

            match Self::cue_from_lines(lines[timing_at], &lines[timing_at + 1..]) {
                Ok(segment) => segments.push(segment),
                Err(reason) => diagnostics.push(Diagnostic::DroppedBlock { block: block_no, reason }),
            }
        }

        (segments, diagnostics)
    }

    fn cue_from_lines(timing: &str, text_lines: &[&str]) -> Result<TimedSegment, DropReason> {
        let captures = CUE_TIMING_REGEX.captures(timing).ok_or(DropReason::MalformedTiming)?;
        let start = parse_timestamp(&captures[1]);
        let end = parse_timestamp(&captures[2]);

        let text = text_lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Err(DropReason::EmptyText);
        }

        Ok(TimedSegment::new(0, start, end, text))
    }

    // @parses: `Dialogue:` lines of the [Events] section
    fn parse_ass(text: &str) -> (Vec<TimedSegment>, Vec<Diagnostic>) {
        let mut segments = Vec::new();
        let mut diagnostics = Vec::new();
        let mut in_events = false;
        let mut dialogue_no = 0;

        for line in text.lines() {
            let line = line.trim();
            if line.starts_with('[') && line.ends_with(']') {
                in_events = line.eq_ignore_ascii_case("[events]");
                continue;
            }
            if !in_events {
                continue;
            }
            let Some(body) = line.strip_prefix("Dialogue:") else {
                continue;
            };
            dialogue_no += 1;

            let fields: Vec<&str> = body.splitn(10, ',').collect();
            if fields.len() < 10 {
                diagnostics.push(Diagnostic::DroppedBlock {
                    block: dialogue_no,
                    reason: DropReason::MalformedDialogue,
                });
                continue;
            }

            let start = parse_timestamp(fields[1]);
            let end = parse_timestamp(fields[2]);
            let text = ASS_OVERRIDE_REGEX.replace_all(fields[9], "").trim().to_string();

            if text.is_empty() {
                diagnostics.push(Diagnostic::DroppedBlock { block: dialogue_no, reason: DropReason::EmptyText });
                continue;
            }

            segments.push(TimedSegment::new(0, start, end, text));
        }

        if dialogue_no == 0 {
            warn!("ASS input has no [Events] dialogue lines");
        }

        (segments, diagnostics)
    }

    // @parses: One fixed-span segment per non-blank line
    fn parse_plain_text(text: &str) -> Vec<TimedSegment> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i, line)| {
                let start = i as f64 * PLAIN_TEXT_SPAN_SECS;
                TimedSegment::new(0, start, start + PLAIN_TEXT_SPAN_SECS, line)
            })
            .collect()
    }
}

/// Convert `HH:MM:SS,mmm`, `HH:MM:SS.mmm`, `H:MM:SS.cc` or `MM:SS.mmm` to seconds.
///
/// Anything unparsable yields `0.0`.
pub fn parse_timestamp(value: &str) -> f64 {
    let Some(captures) = CLOCK_REGEX.captures(value.trim()) else {
        return 0.0;
    };

    let hours: f64 = captures.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0.0);
    let minutes: f64 = captures[2].parse().unwrap_or(0.0);
    let seconds: f64 = captures[3].parse().unwrap_or(0.0);
    let fraction = captures
        .get(4)
        .map(|m| {
            let digits = m.as_str();
            digits.parse::<f64>().unwrap_or(0.0) / 10f64.powi(digits.len() as i32)
        })
        .unwrap_or(0.0);

    hours * 3600.0 + minutes * 60.0 + seconds + fraction
}

/// Render seconds as `MM:SS`, or `HH:MM:SS` past the first hour
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Latest end time over a segment list, 0.0 when empty
pub fn transcript_end(segments: &[TimedSegment]) -> f64 {
    segments.iter().map(|s| s.end).fold(0.0, f64::max)
}
