/*!
 * Integration tests for application lifecycle
 */

use std::fs;

use anyhow::Result;
use serde_json::Value;
use subnarrate::app_config::Config;
use subnarrate::app_controller::Controller;
use subnarrate::narration::{NarrationRequest, NarrationStyle, TargetAudience};
use crate::common;
use crate::common::mock_providers::MockProvider;

/// Test the controller built from the default configuration
#[test]
fn test_controller_initialization_withDefaultConfig_shouldSucceed() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;
    assert_eq!(controller.config().narration.providers.len(), 5);
    Ok(())
}

/// Test that an invalid configuration is rejected
#[test]
fn test_controller_initialization_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.narration.timeout_secs = 0;
    assert!(Controller::with_config(config).is_err());
}

/// Test a single-file run writing its report next to the input
#[tokio::test]
async fn test_run_withSubtitleFile_shouldWriteJsonReport() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle_path = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let controller = Controller::with_backends(Config::default(), vec![MockProvider::working().boxed()])?;

    let request = NarrationRequest::character("Mia", NarrationStyle::Humorous, TargetAudience::General);
    let written = controller.run(subtitle_path, None, &request, false).await?;

    let report_path = written.expect("report should be written");
    assert_eq!(report_path, temp_dir.path().join("episode.narration.json"));

    let report: Value = serde_json::from_str(&fs::read_to_string(&report_path)?)?;
    assert_eq!(report["source"], "episode.srt");
    assert_eq!(report["format"], "srt");
    assert_eq!(report["subtitle_segments"], 3);
    assert_eq!(report["narration"]["metadata"]["service_used"], "MockWorking");
    assert_eq!(report["narration"]["metadata"]["mode"], "character");
    assert_eq!(report["narration"]["metadata"]["character_name"], "Mia");
    assert!(report["analysis"]["characters"].as_array().is_some_and(|c| c.iter().any(|n| n == "Mia")));
    assert_eq!(report["highlights"].as_array().map(Vec::len), Some(4));
    assert!(report.get("video").is_none());
    Ok(())
}

/// Test that an existing report is kept unless forced
#[tokio::test]
async fn test_run_withExistingReport_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle_path = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let report_path = common::create_test_file(temp_dir.path(), "episode.narration.json", "{}")?;
    let controller = Controller::with_backends(Config::default(), vec![MockProvider::working().boxed()])?;

    let skipped = controller.run(subtitle_path.clone(), None, &NarrationRequest::default(), false).await?;
    assert!(skipped.is_none());
    assert_eq!(fs::read_to_string(&report_path)?, "{}");

    let forced = controller.run(subtitle_path, None, &NarrationRequest::default(), true).await?;
    assert_eq!(forced, Some(report_path.clone()));
    assert_ne!(fs::read_to_string(&report_path)?, "{}");
    Ok(())
}

/// Test a missing input file
#[test]
fn test_run_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_backends(Config::default(), Vec::new())?;

    let result = tokio_test::block_on(async {
        controller
            .run(temp_dir.path().join("missing.srt"), None, &NarrationRequest::default(), false)
            .await
    });
    assert!(result.is_err(), "A missing input file should be reported as an error");
    Ok(())
}

/// Test folder processing with one unusable file
#[tokio::test]
async fn test_run_folder_withMixedFiles_shouldWriteReportsForUsableOnes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_subtitle(temp_dir.path(), "one.srt")?;
    common::create_test_file(temp_dir.path(), "two.txt", "A quiet morning.\nSuddenly the phone rings!\n")?;
    common::create_test_file(temp_dir.path(), "broken.srt", "1\nno timing here\ntext\n")?;
    common::create_test_file(temp_dir.path(), "readme.md", "not a subtitle")?;

    let controller = Controller::with_backends(Config::default(), vec![MockProvider::failing().boxed()])?;
    controller
        .run_folder(temp_dir.path().to_path_buf(), &NarrationRequest::default(), false)
        .await?;

    assert!(temp_dir.path().join("one.narration.json").exists());
    assert!(temp_dir.path().join("two.narration.json").exists());
    assert!(!temp_dir.path().join("broken.narration.json").exists());
    Ok(())
}

/// Test folder processing on an empty directory
#[tokio::test]
async fn test_run_folder_withNoSubtitles_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_backends(Config::default(), Vec::new())?;

    let result = controller
        .run_folder(temp_dir.path().to_path_buf(), &NarrationRequest::default(), false)
        .await;
    assert!(result.is_err());
    Ok(())
}
