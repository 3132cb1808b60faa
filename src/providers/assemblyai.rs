use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AudioPayload, ProviderSettings, TranscriptionProvider, TranscriptionService, check_status, http_client, parse_json};
use crate::errors::ProviderError;
use crate::transcript::{Utterance, Word};

/// AssemblyAI client for the upload / transcript / poll workflow
#[derive(Debug)]
pub struct AssemblyAi {
    client: Client,
    settings: ProviderSettings,
}

/// Response of `POST /v2/upload`
#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

/// Body of `POST /v2/transcript`
#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
    speech_model: &'a str,
    speaker_labels: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    speakers_expected: Option<u32>,
    punctuate: bool,
}

/// A word with millisecond timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyAiWord {
    pub text: String,
    pub start: u64,
    pub end: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// A speaker turn, present when speaker labels were requested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyAiUtterance {
    pub speaker: String,
    pub start: u64,
    pub end: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub words: Vec<AssemblyAiWord>,
}

/// Transcript resource returned by create and poll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyAiTranscript {
    pub id: String,
    /// queued, processing, completed or error
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub words: Option<Vec<AssemblyAiWord>>,
    #[serde(default)]
    pub utterances: Option<Vec<AssemblyAiUtterance>>,
}

impl AssemblyAi {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            client: http_client(),
            settings,
        }
    }

    fn url(&self, path: &str) -> String {
        self.settings.api_url(TranscriptionService::AssemblyAi, path)
    }

    async fn upload(&self, audio: &AudioPayload) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(self.url("/v2/upload"))
            .header("authorization", &self.settings.api_key)
            .header("Content-Type", "application/octet-stream")
            .body(audio.bytes.clone())
            .send()
            .await?;
        let response = check_status(TranscriptionService::AssemblyAi, response).await?;
        let upload: UploadResponse = parse_json(response).await?;
        debug!("AssemblyAI upload stored at {}", upload.upload_url);
        Ok(upload.upload_url)
    }

    async fn create_transcript(&self, audio_url: &str) -> Result<AssemblyAiTranscript, ProviderError> {
        let request = TranscriptRequest {
            audio_url,
            speech_model: self.settings.model_or_default(TranscriptionService::AssemblyAi),
            speaker_labels: self.settings.diarize,
            speakers_expected: self.settings.max_speakers.filter(|_| self.settings.diarize),
            punctuate: true,
        };
        let response = self
            .client
            .post(self.url("/v2/transcript"))
            .header("authorization", &self.settings.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(TranscriptionService::AssemblyAi, response).await?;
        parse_json(response).await
    }

    async fn fetch_transcript(&self, id: &str) -> Result<AssemblyAiTranscript, ProviderError> {
        let response = self
            .client
            .get(self.url(&format!("/v2/transcript/{}", id)))
            .header("authorization", &self.settings.api_key)
            .send()
            .await?;
        let response = check_status(TranscriptionService::AssemblyAi, response).await?;
        parse_json(response).await
    }
}

#[async_trait]
impl TranscriptionProvider for AssemblyAi {
    type Response = AssemblyAiTranscript;

    fn service(&self) -> TranscriptionService {
        TranscriptionService::AssemblyAi
    }

    async fn transcribe(&self, audio: &AudioPayload) -> Result<AssemblyAiTranscript, ProviderError> {
        let audio_url = self.upload(audio).await?;
        let mut transcript = self.create_transcript(&audio_url).await?;
        info!("AssemblyAI transcript {} queued", transcript.id);

        loop {
            match transcript.status.as_str() {
                "completed" => return Ok(transcript),
                "error" => {
                    return Err(ProviderError::JobFailed(
                        transcript.error.unwrap_or_else(|| "no error message".to_string()),
                    ));
                }
                status => debug!("AssemblyAI transcript {} is {}", transcript.id, status),
            }
            tokio::time::sleep(self.settings.poll_interval).await;
            transcript = self.fetch_transcript(&transcript.id).await?;
        }
    }

    fn utterances(response: &AssemblyAiTranscript) -> Vec<Utterance> {
        let convert = |words: &[AssemblyAiWord]| {
            words
                .iter()
                .map(|w| Word::new(w.text.clone(), w.start, w.end))
                .collect::<Vec<_>>()
        };

        match &response.utterances {
            Some(utterances) if !utterances.is_empty() => utterances
                .iter()
                .map(|u| Utterance::new(Some(u.speaker.clone()), convert(&u.words)))
                .collect(),
            _ => {
                let words = response.words.as_deref().unwrap_or_default();
                if words.is_empty() {
                    Vec::new()
                } else {
                    vec![Utterance::new(None, convert(words))]
                }
            }
        }
    }
}
