// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use subnarrate::app_config::{Config, LogLevel};
use subnarrate::app_controller::Controller;
use subnarrate::file_utils::FileManager;
use subnarrate::highlights::FrameAnalysis;
use subnarrate::narration::{NarrationRequest, NarrationStyle, TargetAudience};
use subnarrate::subtitle_processor::TimedSegment;

/// CLI Wrapper for NarrationStyle to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliStyle {
    Professional,
    Humorous,
    Emotional,
    Suspenseful,
    Casual,
    Dramatic,
}

impl From<CliStyle> for NarrationStyle {
    fn from(style: CliStyle) -> Self {
        match style {
            CliStyle::Professional => NarrationStyle::Professional,
            CliStyle::Humorous => NarrationStyle::Humorous,
            CliStyle::Emotional => NarrationStyle::Emotional,
            CliStyle::Suspenseful => NarrationStyle::Suspenseful,
            CliStyle::Casual => NarrationStyle::Casual,
            CliStyle::Dramatic => NarrationStyle::Dramatic,
        }
    }
}

/// CLI Wrapper for TargetAudience to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliAudience {
    General,
    Young,
    Professional,
    Children,
}

impl From<CliAudience> for TargetAudience {
    fn from(audience: CliAudience) -> Self {
        match audience {
            CliAudience::General => TargetAudience::General,
            CliAudience::Young => TargetAudience::Young,
            CliAudience::Professional => TargetAudience::Professional,
            CliAudience::Children => TargetAudience::Children,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// Narration options shared by `narrate` and `run`
#[derive(Args, Debug, Clone)]
struct NarrationArgs {
    /// Narration style (defaults to the config value)
    #[arg(short, long, value_enum)]
    style: Option<CliStyle>,

    /// Target audience (defaults to the config value)
    #[arg(short, long, value_enum)]
    audience: Option<CliAudience>,

    /// Narrate in the first person as this character
    #[arg(long, value_name = "NAME")]
    character: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a subtitle file and print segments with their analysis
    Parse {
        /// Subtitle file (.srt, .vtt, .ass, .ssa, .txt)
        #[arg(value_name = "SUBTITLE")]
        input: PathBuf,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate narration for a subtitle file
    Narrate {
        #[arg(value_name = "SUBTITLE")]
        input: PathBuf,

        #[command(flatten)]
        narration: NarrationArgs,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Select highlights from narration JSON (a segment list, narration result or report)
    Highlights {
        #[arg(value_name = "NARRATION_JSON")]
        input: PathBuf,

        /// JSON list of analyzed frames
        #[arg(long)]
        frames: Option<PathBuf>,

        /// Video length in seconds; narration past it is dropped
        #[arg(long)]
        duration: Option<f64>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the full pipeline on a subtitle file or a directory of them
    Run {
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Video used for guided frame analysis (single file only)
        #[arg(long)]
        video: Option<PathBuf>,

        #[command(flatten)]
        narration: NarrationArgs,

        /// Force overwrite of existing reports
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Generate shell completions for subnarrate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subnarrate - subtitle narration and highlight selection
#[derive(Parser, Debug)]
#[command(name = "subnarrate")]
#[command(version)]
#[command(about = "Turn subtitles into timed narration and highlight clips")]
#[command(long_about = "subnarrate parses subtitle tracks, writes a narration script with AI providers
(falling back to a template when none answers) and picks highlight intervals.

EXAMPLES:
    subnarrate parse movie.srt                       # Segments and content analysis
    subnarrate narrate -s humorous movie.srt         # Narration as JSON
    subnarrate narrate --character Anna movie.srt    # First-person narration
    subnarrate highlights movie.narration.json       # Highlights from a report
    subnarrate run --video movie.mp4 movie.srt       # Full pipeline with frame analysis
    subnarrate run -f /subtitles/                    # Every subtitle file in a directory
    subnarrate completions bash > subnarrate.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist, a
    default one is created. API keys can also come from QWEN_API_KEY,
    QWEN_VL_API_KEY, ERNIE_API_KEY/ERNIE_SECRET_KEY, OPENAI_API_KEY and
    ANTHROPIC_API_KEY.

SUPPORTED PROVIDERS (tried in config order):
    qwen, ernie, openai, anthropic, ollama")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => ("", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration(record.level());
            let _ = writeln!(std::io::stderr(), "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once options are known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "subnarrate", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        log::set_max_level(LogLevel::from(level.clone()).to_level_filter());
    }

    let config = load_config(&cli.config_path, cli.log_level.clone())?;
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    match cli.command {
        Commands::Parse { input, output } => {
            let controller = Controller::with_config(config)?;
            let raw = FileManager::read_bytes(&input)?;
            let track = controller.parse_subtitle(&raw, &file_name(&input))?;
            emit_json(&track, output.as_deref())
        }
        Commands::Narrate { input, narration, output } => {
            let request = narration_request(&narration, &config);
            let controller = Controller::with_config(config)?;
            let raw = FileManager::read_bytes(&input)?;
            let track = controller.parse_subtitle(&raw, &file_name(&input))?;
            let result = controller
                .generate_narration(&track.segments, &track.analysis, &request, None)
                .await;
            for diagnostic in &result.diagnostics {
                warn!("{}", diagnostic);
            }
            emit_json(&result, output.as_deref())
        }
        Commands::Highlights { input, frames, duration, output } => {
            let controller = Controller::with_config(config)?;
            let (segments, characters) = read_narration_json(&input)?;
            let frames: Vec<FrameAnalysis> = match frames {
                Some(path) => read_json(&path)?,
                None => Vec::new(),
            };
            let (highlights, diagnostics) = controller.select_highlights(&segments, &frames, &characters, duration)?;
            for diagnostic in &diagnostics {
                warn!("{}", diagnostic);
            }
            emit_json(&highlights, output.as_deref())
        }
        Commands::Run { input_path, video, narration, force_overwrite } => {
            let request = narration_request(&narration, &config);
            let controller = Controller::with_config(config)?;
            if input_path.is_file() {
                controller.run(input_path, video, &request, force_overwrite).await?;
            } else if input_path.is_dir() {
                if video.is_some() {
                    warn!("--video is ignored in folder mode; videos are matched by file stem");
                }
                controller.run_folder(input_path, &request, force_overwrite).await?;
            } else {
                return Err(anyhow!("Input path does not exist: {:?}", input_path));
            }
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

// @returns: Config from file (created with defaults when missing) plus env overrides
fn load_config(config_path: &str, log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(level) = log_level {
        config.log_level = level.into();
    }

    let applied = config.apply_env_overrides(|name| std::env::var(name).ok());
    if applied > 0 {
        info!("Applied {} credential(s) from the environment", applied);
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn narration_request(args: &NarrationArgs, config: &Config) -> NarrationRequest {
    let style = args.style.clone().map(Into::into).unwrap_or(config.narration.style);
    let audience = args.audience.clone().map(Into::into).unwrap_or(config.narration.target_audience);
    match &args.character {
        Some(name) => NarrationRequest::character(name.clone(), style, audience),
        None => NarrationRequest::third_person(style, audience),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).context(format!("Failed to open {:?}", path))?;
    serde_json::from_reader(BufReader::new(file)).context(format!("Failed to parse JSON in {:?}", path))
}

// @returns: Narration segments and known characters from any of the JSON shapes we write
fn read_narration_json(path: &Path) -> Result<(Vec<TimedSegment>, BTreeSet<String>)> {
    let value: Value = read_json(path)?;

    let segments = value
        .pointer("/narration/segments")
        .or_else(|| value.get("segments"))
        .unwrap_or(&value)
        .clone();
    let segments: Vec<TimedSegment> = serde_json::from_value(segments)
        .context("Expected a list of narration segments")?;

    let characters = value
        .pointer("/analysis/characters")
        .cloned()
        .map(serde_json::from_value::<BTreeSet<String>>)
        .transpose()
        .context("Invalid analysis.characters")?
        .unwrap_or_default();

    Ok((segments, characters))
}

fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match output {
        Some(path) => {
            FileManager::write_to_file(path, &json)?;
            info!("Success: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
