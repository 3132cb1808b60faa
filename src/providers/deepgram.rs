use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{AudioPayload, ProviderSettings, TranscriptionProvider, TranscriptionService, check_status, http_client, parse_json};
use crate::errors::ProviderError;
use crate::transcript::{Utterance, Word};

/// Deepgram pre-recorded audio client
#[derive(Debug)]
pub struct Deepgram {
    client: Client,
    settings: ProviderSettings,
}

/// A word with timing in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepgramWord {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punctuated_word: Option<String>,
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<u32>,
}

impl DeepgramWord {
    fn to_word(&self) -> Word {
        let text = self.punctuated_word.as_deref().unwrap_or(&self.word);
        Word::from_seconds(text, self.start, self.end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepgramAlternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub words: Vec<DeepgramWord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepgramChannel {
    #[serde(default)]
    pub alternatives: Vec<DeepgramAlternative>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepgramUtterance {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub transcript: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<u32>,
    #[serde(default)]
    pub words: Vec<DeepgramWord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepgramResults {
    #[serde(default)]
    pub channels: Vec<DeepgramChannel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utterances: Option<Vec<DeepgramUtterance>>,
}

/// Response of `POST /v1/listen`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepgramResponse {
    pub results: DeepgramResults,
}

impl Deepgram {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            client: http_client(),
            settings,
        }
    }

    fn listen_url(&self) -> Result<Url, ProviderError> {
        let base = self.settings.api_url(TranscriptionService::Deepgram, "/v1/listen");
        let mut url = Url::parse(&base).map_err(|e| ProviderError::RequestFailed(format!("invalid endpoint {}: {}", base, e)))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("model", self.settings.model_or_default(TranscriptionService::Deepgram))
                .append_pair("punctuate", "true")
                .append_pair("utterances", "true");
            if self.settings.diarize {
                query.append_pair("diarize", "true");
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl TranscriptionProvider for Deepgram {
    type Response = DeepgramResponse;

    fn service(&self) -> TranscriptionService {
        TranscriptionService::Deepgram
    }

    async fn transcribe(&self, audio: &AudioPayload) -> Result<DeepgramResponse, ProviderError> {
        let url = self.listen_url()?;
        debug!("Deepgram request {}", url);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Token {}", self.settings.api_key))
            .header("Content-Type", &audio.mime_type)
            .body(audio.bytes.clone())
            .send()
            .await?;
        let response = check_status(TranscriptionService::Deepgram, response).await?;
        parse_json(response).await
    }

    fn utterances(response: &DeepgramResponse) -> Vec<Utterance> {
        if let Some(utterances) = response.results.utterances.as_ref().filter(|u| !u.is_empty()) {
            return utterances
                .iter()
                .map(|u| {
                    let words = u.words.iter().map(DeepgramWord::to_word).collect();
                    Utterance::new(u.speaker.map(|s| s.to_string()), words)
                })
                .collect();
        }

        // No utterance segmentation, fall back to the flat word stream
        let words: Vec<Word> = response
            .results
            .channels
            .first()
            .and_then(|channel| channel.alternatives.first())
            .map(|alt| alt.words.iter().map(DeepgramWord::to_word).collect())
            .unwrap_or_default();

        if words.is_empty() {
            Vec::new()
        } else {
            vec![Utterance::new(None, words)]
        }
    }
}
