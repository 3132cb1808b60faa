// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use captionkit::app_config::{self, Config};
use captionkit::{CaptionSource, CaptionStyle, Captioner, TranscriptionRequest, TranscriptionService, preset_names};

/// CLI Wrapper for TranscriptionService to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliService {
    Assemblyai,
    Deepgram,
    Openai,
}

impl From<CliService> for TranscriptionService {
    fn from(cli_service: CliService) -> Self {
        match cli_service {
            CliService::Assemblyai => TranscriptionService::AssemblyAi,
            CliService::Deepgram => TranscriptionService::Deepgram,
            CliService::Openai => TranscriptionService::OpenAi,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Transcription options shared by `transcribe` and `process`
#[derive(Parser, Debug)]
struct TranscribeOptions {
    /// Transcription service (defaults to the config)
    #[arg(short, long, value_enum)]
    service: Option<CliService>,

    /// API key (defaults to the config, then the service's environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Pre-extracted audio file to send instead of extracting it
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Give up on transcription after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl TranscribeOptions {
    fn request(&self) -> TranscriptionRequest {
        TranscriptionRequest {
            service: self.service.map(Into::into),
            api_key: self.api_key.clone(),
            audio: self.audio.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Burn captions from an SRT file into a video
    Caption {
        /// Input video
        video: PathBuf,

        /// SRT file with the captions
        #[arg(long)]
        srt: PathBuf,

        /// Output video (default: <stem>_captioned.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Style preset overriding the configured style
        #[arg(short, long)]
        preset: Option<String>,
    },

    /// Transcribe a video or audio file to SRT
    Transcribe {
        /// Input media
        media: PathBuf,

        /// Output SRT file (default: <stem>.srt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: TranscribeOptions,
    },

    /// Transcribe a video and burn the captions into it
    Process {
        /// Input video
        video: PathBuf,

        /// Output video (default: <stem>_captioned.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Style preset overriding the configured style
        #[arg(short, long)]
        preset: Option<String>,

        #[command(flatten)]
        options: TranscribeOptions,
    },

    /// List the built-in style presets
    Presets {
        /// Print each preset as JSON config
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions for captionkit
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// captionkit - styled, animated captions for videos
///
/// Burns captions from SRT files into videos with ffmpeg, or transcribes the
/// audio first with AssemblyAI, Deepgram or OpenAI.
#[derive(Parser, Debug)]
#[command(name = "captionkit")]
#[command(version)]
#[command(about = "Burn styled, animated captions into videos")]
#[command(long_about = "captionkit burns styled, animated captions into videos with ffmpeg.

EXAMPLES:
    captionkit caption clip.mp4 --srt clip.srt            # Caption from an SRT file
    captionkit caption clip.mp4 --srt clip.srt -p classic # Use a style preset
    captionkit transcribe clip.mp4 -s deepgram            # Write clip.srt
    captionkit process clip.mp4 -s openai                 # Transcribe and caption
    captionkit presets --json                             # Show preset settings
    captionkit completions bash > captionkit.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. API keys may also be given through the
    ASSEMBLYAI_API_KEY, DEEPGRAM_API_KEY and OPENAI_API_KEY environment variables.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with("captionkit")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();
    if let Some(level) = cli.log_level {
        log::set_max_level(app_config::LogLevel::from(level).to_level_filter());
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "captionkit", &mut std::io::stdout());
            Ok(())
        }
        Commands::Presets { json } => list_presets(json),
        command => {
            let config = load_config(&cli.config, cli.log_level)?;
            run(command, config).await
        }
    }
}

// Load the config file, creating a default one if it doesn't exist
fn load_config(path: &Path, log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load(path).with_context(|| format!("Failed to load config file: {:?}", path))?
    } else {
        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config
            .save(path)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;
        config
    };

    match log_level {
        Some(level) => config.log_level = level.into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn captioner_for(config: Config, preset: Option<&str>) -> Result<Captioner> {
    let captioner = Captioner::with_config(config).context("Failed to set up captioner")?;
    match preset {
        Some(name) => Ok(captioner.with_preset(name)?),
        None => Ok(captioner),
    }
}

async fn run(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Caption {
            video,
            srt,
            output,
            preset,
        } => {
            let captioner = captioner_for(config, preset.as_deref())?;
            let written = with_spinner(
                "Rendering captions",
                captioner.add_captions(&video, CaptionSource::SrtFile(srt), output.as_deref()),
            )
            .await?;
            info!("Success: {:?}", written);
        }
        Commands::Transcribe { media, output, options } => {
            let captioner = captioner_for(config, None)?;
            let request = options.request();
            let written = with_spinner(
                "Transcribing",
                captioner.extract_subtitles(&media, &request, output.as_deref()),
            )
            .await?;
            info!("Success: {:?}", written);
        }
        Commands::Process {
            video,
            output,
            preset,
            options,
        } => {
            let captioner = captioner_for(config, preset.as_deref())?;
            let request = options.request();
            let written = with_spinner(
                "Transcribing and rendering",
                captioner.process_video(&video, &request, output.as_deref()),
            )
            .await?;
            info!("Success: {:?}", written);
        }
        Commands::Presets { .. } | Commands::Completions { .. } => {}
    }
    Ok(())
}

fn list_presets(json: bool) -> Result<()> {
    let mut stdout = std::io::stdout();
    for name in preset_names() {
        if json {
            let style = CaptionStyle::preset(name)?;
            let config = serde_json::to_string_pretty(&style.to_config())?;
            writeln!(stdout, "{}: {}", name, config)?;
        } else {
            writeln!(stdout, "{}", name)?;
        }
    }
    Ok(())
}

// Show a spinner on stderr while `task` runs
async fn with_spinner<T, F>(message: &'static str, task: F) -> Result<T>
where
    F: Future<Output = captionkit::Result<T>>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = task.await;
    match &result {
        Ok(_) => spinner.finish_with_message(format!("{} done", message)),
        Err(_) => spinner.abandon_with_message(format!("{} failed", message)),
    }
    Ok(result?)
}
