//! Loading, validating and saving the captionkit configuration file.

use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{CaptionError, Result};
use crate::file_utils::FileManager;
use crate::media::MediaTools;
use crate::providers::{ProviderSettings, TranscriptionService};
use crate::renderer::Renderer;
use crate::style::{CaptionStyle, StyleConfig};
use crate::transcript::GroupingPolicy;

/// Top-level captionkit settings, stored as JSON
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Caption appearance
    #[serde(default)]
    pub style: StyleConfig,

    /// Transcription service settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// How transcribed words are grouped into cues
    #[serde(default)]
    pub grouping: GroupingPolicy,

    /// ffmpeg settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub service: TranscriptionService,

    // @field: Model name, empty for the service default
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key, empty to read the environment
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL, empty for the public API
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds for the whole transcription
    #[serde(default = "default_transcription_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param service: Transcription service
    // @returns: Provider config with defaults
    pub fn new(service: TranscriptionService) -> Self {
        Self {
            service,
            model: service.default_model().to_string(),
            api_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_transcription_timeout_secs(),
        }
    }
}

/// Speaker diarization settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DiarizationConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Expected number of speakers, passed to providers that accept a hint
    #[serde(default = "default_max_speakers")]
    pub max_speakers: u32,
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_speakers: default_max_speakers(),
        }
    }
}

/// Transcription service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscriptionConfig {
    /// Service used when a request does not name one
    #[serde(default)]
    pub service: TranscriptionService,

    /// Available transcription providers
    #[serde(default = "default_providers")]
    pub available_providers: Vec<ProviderConfig>,

    /// Delay between status checks for job-based providers
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub diarization: DiarizationConfig,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            service: TranscriptionService::default(),
            available_providers: default_providers(),
            poll_interval_ms: default_poll_interval_ms(),
            diarization: DiarizationConfig::default(),
        }
    }
}

impl TranscriptionConfig {
    /// Get a specific provider configuration by service
    pub fn get_provider_config(&self, service: TranscriptionService) -> Option<&ProviderConfig> {
        self.available_providers.iter().find(|p| p.service == service)
    }

    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(self.service)
    }

    /// API key from the provider config, falling back to the service's environment variable
    pub fn get_api_key(&self, service: TranscriptionService) -> Option<String> {
        self.get_provider_config(service)
            .map(|p| p.api_key.trim().to_string())
            .filter(|key| !key.is_empty())
            .or_else(|| {
                std::env::var(service.api_key_env_var())
                    .ok()
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty())
            })
    }

    pub fn timeout(&self, service: TranscriptionService) -> Duration {
        let secs = self
            .get_provider_config(service)
            .map(|p| p.timeout_secs)
            .unwrap_or_else(default_transcription_timeout_secs);
        Duration::from_secs(secs)
    }

    /// Client settings for `service`; `api_key` overrides config and environment
    pub fn provider_settings(&self, service: TranscriptionService, api_key: Option<&str>) -> Result<ProviderSettings> {
        let api_key = api_key
            .map(str::to_string)
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.get_api_key(service))
            .ok_or_else(|| {
                CaptionError::Config(format!(
                    "no API key for {}: set it in the config or the {} environment variable",
                    service,
                    service.api_key_env_var()
                ))
            })?;

        let mut settings = ProviderSettings::new(api_key)
            .poll_interval(Duration::from_millis(self.poll_interval_ms))
            .diarize(self.diarization.enabled, Some(self.diarization.max_speakers));
        if let Some(provider) = self.get_provider_config(service) {
            settings = settings.endpoint(provider.endpoint.clone()).model(provider.model.clone());
        }
        Ok(settings)
    }
}

/// ffmpeg / ffprobe settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RenderConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Timeout for one render or audio extraction
    #[serde(default = "default_render_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout for the ffprobe duration check before a render
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// x264 preset passed to ffmpeg
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Extra directory searched for font files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonts_dir: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_render_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            preset: default_preset(),
            fonts_dir: None,
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn media_tools(&self) -> MediaTools {
        MediaTools::new(&self.ffmpeg_path, &self.ffprobe_path)
    }

    pub fn renderer(&self) -> Renderer {
        Renderer::new(self.media_tools(), self.preset.clone(), self.timeout())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_providers() -> Vec<ProviderConfig> {
    TranscriptionService::all().into_iter().map(ProviderConfig::new).collect()
}

fn default_transcription_timeout_secs() -> u64 {
    600
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_max_speakers() -> u32 {
    3
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_render_timeout_secs() -> u64 {
    1800
}

fn default_probe_timeout_secs() -> u64 {
    30
}

fn default_preset() -> String {
    "medium".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    ///
    /// API keys are not checked here; they are only needed once a
    /// transcription is requested.
    pub fn validate(&self) -> Result<()> {
        self.caption_style()?;

        if self.grouping.max_words == 0 {
            return Err(CaptionError::Config("grouping.max_words must be positive".to_string()));
        }
        if self.grouping.max_cue_ms == 0 {
            return Err(CaptionError::Config("grouping.max_cue_ms must be positive".to_string()));
        }
        if self.transcription.poll_interval_ms == 0 {
            return Err(CaptionError::Config(
                "transcription.poll_interval_ms must be positive".to_string(),
            ));
        }
        if let Some(provider) = self.transcription.available_providers.iter().find(|p| p.timeout_secs == 0) {
            return Err(CaptionError::Config(format!(
                "timeout_secs for {} must be positive",
                provider.service
            )));
        }
        if self.render.timeout_secs == 0 {
            return Err(CaptionError::Config("render.timeout_secs must be positive".to_string()));
        }
        if self.render.probe_timeout_secs == 0 {
            return Err(CaptionError::Config("render.probe_timeout_secs must be positive".to_string()));
        }
        if self.render.ffmpeg_path.trim().is_empty() || self.render.ffprobe_path.trim().is_empty() {
            return Err(CaptionError::Config("render tool paths must not be empty".to_string()));
        }

        Ok(())
    }

    /// Validated caption style described by this config
    pub fn caption_style(&self) -> Result<CaptionStyle> {
        CaptionStyle::from_config(&self.style)
    }

    /// Load a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        FileManager::require_file(path)?;
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CaptionError::Config(format!("failed to parse config file {:?}: {}", path, e)))
    }

    /// Write the config as pretty JSON, atomically
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CaptionError::Config(format!("failed to serialize config: {}", e)))?;
        FileManager::write_atomic(path.as_ref(), json.as_bytes())
    }
}
