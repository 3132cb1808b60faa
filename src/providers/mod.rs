/*!
 * Transcription provider clients.
 *
 * This module contains client implementations for the hosted speech-to-text
 * services captionkit can use:
 * - AssemblyAI: upload, create a transcript job, poll until done
 * - Deepgram: single pre-recorded `listen` request
 * - OpenAI: multipart `audio/transcriptions` request
 *
 * Each client returns its provider-native response. `utterances` maps that
 * response onto the common word model, and the shared `GroupingPolicy` turns
 * it into cues, so caption timing does not depend on the provider.
 */

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cue_track::CueTrack;
use crate::errors::{CaptionError, ProviderError, Result};
use crate::transcript::{GroupingPolicy, Utterance};

pub mod assemblyai;
pub mod deepgram;
pub mod openai;

pub use assemblyai::AssemblyAi;
pub use deepgram::Deepgram;
pub use openai::OpenAi;

/// Audio bytes plus what the provider needs to know about them
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl AudioPayload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        Self {
            mime_type: mime_for(&file_name).to_string(),
            file_name,
            bytes: bytes.into(),
        }
    }

    /// Read an audio file into memory
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CaptionError::NotFound(path.to_path_buf()),
            _ => CaptionError::Io(e),
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "ogg" | "opus" => "audio/ogg",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}

/// Supported transcription services
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionService {
    #[default]
    AssemblyAi,
    Deepgram,
    OpenAi,
}

impl TranscriptionService {
    pub fn all() -> [Self; 3] {
        [Self::AssemblyAi, Self::Deepgram, Self::OpenAi]
    }

    /// Environment variable consulted when no key is configured
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Self::AssemblyAi => "ASSEMBLYAI_API_KEY",
            Self::Deepgram => "DEEPGRAM_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::AssemblyAi => "https://api.assemblyai.com",
            Self::Deepgram => "https://api.deepgram.com",
            Self::OpenAi => "https://api.openai.com",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::AssemblyAi => "best",
            Self::Deepgram => "nova-2",
            Self::OpenAi => "whisper-1",
        }
    }
}

impl fmt::Display for TranscriptionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AssemblyAi => "assemblyai",
            Self::Deepgram => "deepgram",
            Self::OpenAi => "openai",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TranscriptionService {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "assemblyai" => Ok(Self::AssemblyAi),
            "deepgram" => Ok(Self::Deepgram),
            "openai" => Ok(Self::OpenAi),
            other => Err(CaptionError::Config(format!(
                "unknown transcription service {:?} (expected assemblyai, deepgram or openai)",
                other
            ))),
        }
    }
}

/// Connection and request settings shared by every client
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    /// Base URL; empty means the service default
    pub endpoint: String,
    /// Model name; empty means the service default
    pub model: String,
    pub diarize: bool,
    pub max_speakers: Option<u32>,
    /// Delay between status checks for job-based APIs
    pub poll_interval: Duration,
}

impl ProviderSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: String::new(),
            model: String::new(),
            diarize: false,
            max_speakers: None,
            poll_interval: Duration::from_millis(3000),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn diarize(mut self, diarize: bool, max_speakers: Option<u32>) -> Self {
        self.diarize = diarize;
        self.max_speakers = max_speakers;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub(crate) fn api_url(&self, service: TranscriptionService, path: &str) -> String {
        let base = if self.endpoint.is_empty() {
            service.default_endpoint()
        } else {
            self.endpoint.as_str()
        };
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    pub(crate) fn model_or_default(&self, service: TranscriptionService) -> &str {
        if self.model.is_empty() {
            service.default_model()
        } else {
            &self.model
        }
    }
}

/// Common trait for all transcription providers
///
/// Implementations do one request attempt; retry policy belongs to the caller.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync + fmt::Debug {
    /// The provider-native response type
    type Response: Send + Sync;

    fn service(&self) -> TranscriptionService;

    /// Send audio to the provider and wait for its transcript
    async fn transcribe(&self, audio: &AudioPayload) -> std::result::Result<Self::Response, ProviderError>;

    /// Map the native response onto the common word model
    fn utterances(response: &Self::Response) -> Vec<Utterance>;

    /// Native response to a cue track using the shared grouping rule
    fn normalize(response: &Self::Response, policy: &GroupingPolicy) -> CueTrack {
        policy.group(&Self::utterances(response))
    }
}

/// One of the supported clients, selected at runtime
#[derive(Debug)]
pub enum Transcriber {
    AssemblyAi(AssemblyAi),
    Deepgram(Deepgram),
    OpenAi(OpenAi),
}

impl Transcriber {
    pub fn new(service: TranscriptionService, settings: ProviderSettings) -> Self {
        match service {
            TranscriptionService::AssemblyAi => Self::AssemblyAi(AssemblyAi::new(settings)),
            TranscriptionService::Deepgram => Self::Deepgram(Deepgram::new(settings)),
            TranscriptionService::OpenAi => Self::OpenAi(OpenAi::new(settings)),
        }
    }

    pub fn service(&self) -> TranscriptionService {
        match self {
            Self::AssemblyAi(client) => client.service(),
            Self::Deepgram(client) => client.service(),
            Self::OpenAi(client) => client.service(),
        }
    }

    /// Transcribe and group into cues, bounded by `timeout`
    pub async fn transcribe_to_track(
        &self,
        audio: &AudioPayload,
        policy: &GroupingPolicy,
        timeout: Duration,
    ) -> Result<CueTrack> {
        let service = self.service();
        info!("Transcribing {} ({} bytes) with {}", audio.file_name, audio.bytes.len(), service);

        let attempt = async {
            match self {
                Self::AssemblyAi(client) => transcribe_with(client, audio, policy).await,
                Self::Deepgram(client) => transcribe_with(client, audio, policy).await,
                Self::OpenAi(client) => transcribe_with(client, audio, policy).await,
            }
        };

        let outcome = tokio::time::timeout(timeout, attempt)
            .await
            .map_err(|_| CaptionError::Timeout {
                operation: "transcription",
                after: timeout,
            })?;

        let track = outcome.map_err(|cause| {
            error!("{} transcription failed: {}", service, cause);
            CaptionError::Transcription { provider: service, cause }
        })?;
        info!("{} returned {} cues", service, track.len());
        Ok(track)
    }
}

async fn transcribe_with<P: TranscriptionProvider>(
    client: &P,
    audio: &AudioPayload,
    policy: &GroupingPolicy,
) -> std::result::Result<CueTrack, ProviderError> {
    let response = client.transcribe(audio).await?;
    Ok(P::normalize(&response, policy))
}

/// Build the HTTP client used by every provider
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}

/// Turn a non-success response into the matching provider error
pub(crate) async fn check_status(
    service: TranscriptionService,
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    error!("{} API error ({}): {}", service, status, error_text);
    Err(ProviderError::from_status(status.as_u16(), error_text))
}

/// Read a successful response body as JSON
pub(crate) async fn parse_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> std::result::Result<T, ProviderError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ProviderError::ParseError(e.to_string()))
}
