/*!
 * Tests for file utility functions
 */

use std::fs;

use anyhow::Result;
use subnarrate::diagnostics::Diagnostic;
use subnarrate::file_utils::{FileManager, FileType};
use subnarrate::subtitle_processor::SubtitleParser;
use crate::common;

/// Test file existence check
#[test]
fn test_file_exists_withExistingAndMissingFiles_shouldReportCorrectly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file_path = common::create_test_file(temp_dir.path(), "test.txt", "Test content")?;

    assert!(FileManager::file_exists(&file_path));
    assert!(!FileManager::file_exists(temp_dir.path().join("missing.txt")));
    Ok(())
}

/// Test report path generation
#[test]
fn test_generate_output_path_withSuffix_shouldKeepStem() {
    let output = FileManager::generate_output_path("/movies/episode01.srt", "/reports", "narration", "json");
    assert_eq!(output, std::path::PathBuf::from("/reports/episode01.narration.json"));
}

/// Test recursive subtitle discovery
#[test]
fn test_find_subtitle_files_withMixedTree_shouldReturnSortedSubtitlesOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("season1");
    fs::create_dir_all(&nested)?;

    common::create_test_file(temp_dir.path(), "b.srt", "x")?;
    common::create_test_file(&nested, "a.ass", "x")?;
    common::create_test_file(temp_dir.path(), "movie.mp4", "x")?;
    common::create_test_file(temp_dir.path(), "notes.md", "x")?;

    let files = FileManager::find_subtitle_files(temp_dir.path())?;
    assert_eq!(files.len(), 2);
    assert!(files.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(files.iter().all(|f| FileManager::detect_file_type(f) == FileType::Subtitle));
    Ok(())
}

/// Test file type detection
#[test]
fn test_detect_file_type_withKnownExtensions_shouldClassify() {
    assert_eq!(FileManager::detect_file_type("a.SRT"), FileType::Subtitle);
    assert_eq!(FileManager::detect_file_type("a.vtt"), FileType::Subtitle);
    assert_eq!(FileManager::detect_file_type("a.mkv"), FileType::Video);
    assert_eq!(FileManager::detect_file_type("a.docx"), FileType::Unknown);
    assert_eq!(FileManager::detect_file_type("no_extension"), FileType::Unknown);
}

/// Test writing into a directory that does not exist yet
#[test]
fn test_write_to_file_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out").join("report.json");

    FileManager::write_to_file(&path, "{}")?;
    assert_eq!(fs::read_to_string(&path)?, "{}");
    Ok(())
}

/// Test decoding of plain UTF-8
#[test]
fn test_decode_bytes_withUtf8_shouldNotBeLossy() -> Result<()> {
    let decoded = FileManager::decode_bytes("你好, world".as_bytes())?;
    assert_eq!(decoded.text, "你好, world");
    assert_eq!(decoded.encoding, "UTF-8");
    assert!(!decoded.lossy);
    Ok(())
}

/// Test decoding of a UTF-8 byte-order mark
#[test]
fn test_decode_bytes_withUtf8Bom_shouldStripMark() -> Result<()> {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(b"Hello");
    let decoded = FileManager::decode_bytes(&bytes)?;
    assert_eq!(decoded.text, "Hello");
    assert!(!decoded.lossy);
    Ok(())
}

/// Test decoding of UTF-16 found through its byte-order mark
#[test]
fn test_decode_bytes_withUtf16LeBom_shouldNotBeLossy() -> Result<()> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "1\n00:00:01,000 --> 00:00:02,000\nHello\n".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let decoded = FileManager::decode_bytes(&bytes)?;
    assert_eq!(decoded.encoding, "UTF-16LE");
    assert!(decoded.text.starts_with("1\n00:00:01,000"));
    assert!(!decoded.lossy);

    let parsed = SubtitleParser::parse(&bytes, "utf16.srt")?;
    assert_eq!(parsed.segments.len(), 1);
    assert!(parsed.diagnostics.iter().all(|d| !matches!(d, Diagnostic::LossyDecoding { .. })));
    Ok(())
}

/// Test decoding of a legacy Chinese encoding
#[test]
fn test_decode_bytes_withGbk_shouldDetectAndFlagLossy() -> Result<()> {
    let text = "他终于发现了真相。我们必须马上离开这里，危险就在眼前。".repeat(3);
    let (bytes, _, _) = encoding_rs::GBK.encode(&text);
    let decoded = FileManager::decode_bytes(&bytes)?;
    assert!(decoded.lossy);
    assert!(decoded.text.contains("真相"));
    Ok(())
}

/// Test empty input
#[test]
fn test_decode_bytes_withEmptyInput_shouldReturnEmptyText() -> Result<()> {
    let decoded = FileManager::decode_bytes(&[])?;
    assert!(decoded.text.is_empty());
    Ok(())
}
