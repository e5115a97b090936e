/*!
 * Common test utilities for the subnarrate test suite
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use subnarrate::subtitle_processor::TimedSegment;


/// Five SRT blocks; the third has a malformed timing line
pub const SRT_WITH_ONE_BAD_BLOCK: &str = "1
00:00:01,000 --> 00:00:03,000
Anna: Where were you last night?

2
00:00:03,500 --> 00:00:06,000
Ben: I found the secret room.

3
00:00:06,500 -> broken
This block is malformed.

4
00:00:07,000 --> 00:00:10,000
(Anna) You promised me the truth!

5
00:00:10,500 --> 00:00:14,000
Ben: Finally, I will tell you everything.
";

/// Route library logs to the test output; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = r#"1
00:00:01,000 --> 00:00:04,000
Mia: This is where it all started.

2
00:00:05,000 --> 00:00:09,000
Leo: I can't believe you kept the secret!

3
00:00:10,000 --> 00:00:14,000
Mia: We finally know the truth.
"#;
    create_test_file(dir, filename, content)
}

/// `count` back-to-back segments of `span` seconds
pub fn sequential_segments(count: usize, span: f64) -> Vec<TimedSegment> {
    (0..count)
        .map(|i| {
            let start = i as f64 * span;
            TimedSegment::new(i + 1, start, start + span, format!("Segment number {}", i + 1))
        })
        .collect()
}
