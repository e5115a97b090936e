use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use encoding_rs::{Encoding, UTF_8};
use chardetng::EncodingDetector;
use log::debug;

use crate::errors::SubtitleError;

// @module: File and directory utilities

// @const: Extensions recognised as subtitle tracks
const SUBTITLE_EXTENSIONS: [&str; 5] = ["srt", "vtt", "ass", "ssa", "txt"];

// @const: Extensions recognised as video containers
const VIDEO_EXTENSIONS: [&str; 14] = [
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v",
    "mpg", "mpeg", "ogv", "ts", "mts", "m2ts",
];

// @struct: Text recovered from raw subtitle bytes
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    // @field: Decoded content
    pub text: String,

    // @field: Name of the encoding that produced `text`
    pub encoding: &'static str,

    // @field: True when the charset was guessed or undecodable bytes were dropped
    pub lossy: bool,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path for a pipeline report
    // @params: input_file, output_dir, suffix, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(suffix);
        output_filename.push('.');
        output_filename.push_str(extension);

        output_dir.as_ref().join(output_filename)
    }

    /// Find every subtitle file below a directory, sorted by path
    pub fn find_subtitle_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && Self::detect_file_type(path) == FileType::Subtitle {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file's raw bytes
    pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Decode subtitle bytes of unknown encoding.
    ///
    /// Order: byte-order mark, strict UTF-8, detected charset, then a
    /// forgiving UTF-8 decode that drops undecodable bytes.
    pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedText, SubtitleError> {
        if bytes.is_empty() {
            return Ok(DecodedText { text: String::new(), encoding: UTF_8.name(), lossy: false });
        }

        if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
            let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
            if !had_errors {
                return Ok(DecodedText {
                    text: text.into_owned(),
                    encoding: encoding.name(),
                    lossy: false,
                });
            }
        }

        if let Ok(text) = std::str::from_utf8(bytes) {
            return Ok(DecodedText { text: text.to_string(), encoding: UTF_8.name(), lossy: false });
        }

        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        let guessed = detector.guess(None, true);
        let (text, had_errors) = guessed.decode_without_bom_handling(bytes);
        if !had_errors && !text.is_empty() {
            debug!("Subtitle bytes detected as {}", guessed.name());
            return Ok(DecodedText { text: text.into_owned(), encoding: guessed.name(), lossy: true });
        }

        let text: String = String::from_utf8_lossy(bytes)
            .chars()
            .filter(|c| *c != char::REPLACEMENT_CHARACTER)
            .collect();

        if text.is_empty() {
            return Err(SubtitleError::Encoding(format!(
                "{} bytes produced no decodable characters",
                bytes.len()
            )));
        }

        Ok(DecodedText { text, encoding: UTF_8.name(), lossy: true })
    }

    /// Classify a path as subtitle, video or unknown by its extension
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> FileType {
        let Some(ext) = path.as_ref().extension() else {
            return FileType::Unknown;
        };
        let ext = ext.to_string_lossy().to_lowercase();

        if SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
            FileType::Subtitle
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            FileType::Video
        } else {
            FileType::Unknown
        }
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Subtitle track (SRT, VTT, ASS/SSA or plain text)
    Subtitle,
    /// Video file supported by ffmpeg
    Video,
    /// Unknown file type
    Unknown,
}
