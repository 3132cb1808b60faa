use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::{AudioPayload, ProviderSettings, TranscriptionProvider, TranscriptionService, check_status, http_client, parse_json};
use crate::errors::ProviderError;
use crate::transcript::{Utterance, Word, seconds_to_ms};

/// OpenAI audio transcription client
#[derive(Debug)]
pub struct OpenAi {
    client: Client,
    settings: ProviderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSegment {
    #[serde(default)]
    pub id: u32,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub text: String,
}

/// `verbose_json` transcription response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiTranscription {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub words: Vec<OpenAiWord>,
    #[serde(default)]
    pub segments: Vec<OpenAiSegment>,
}

impl OpenAi {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            client: http_client(),
            settings,
        }
    }
}

#[async_trait]
impl TranscriptionProvider for OpenAi {
    type Response = OpenAiTranscription;

    fn service(&self) -> TranscriptionService {
        TranscriptionService::OpenAi
    }

    async fn transcribe(&self, audio: &AudioPayload) -> Result<OpenAiTranscription, ProviderError> {
        let api_url = self.settings.api_url(TranscriptionService::OpenAi, "/v1/audio/transcriptions");
        let model = self.settings.model_or_default(TranscriptionService::OpenAi).to_string();

        let file = Part::bytes(audio.bytes.to_vec())
            .file_name(audio.file_name.clone())
            .mime_str(&audio.mime_type)?;
        let form = Form::new()
            .part("file", file)
            .text("model", model)
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word")
            .text("timestamp_granularities[]", "segment");

        debug!("OpenAI request {}", api_url);
        let response = self
            .client
            .post(&api_url)
            .bearer_auth(&self.settings.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = check_status(TranscriptionService::OpenAi, response).await?;
        parse_json(response).await
    }

    fn utterances(response: &OpenAiTranscription) -> Vec<Utterance> {
        let words: Vec<Word> = response
            .words
            .iter()
            .map(|w| Word::from_seconds(w.word.clone(), w.start, w.end))
            .collect();

        if response.segments.is_empty() {
            return if words.is_empty() {
                Vec::new()
            } else {
                vec![Utterance::new(None, words)]
            };
        }

        // Each word belongs to the segment its start falls in
        let mut remaining = words.into_iter().peekable();
        let mut utterances: Vec<Utterance> = Vec::with_capacity(response.segments.len());
        for segment in &response.segments {
            let segment_end = seconds_to_ms(segment.end);
            let mut segment_words: Vec<Word> =
                std::iter::from_fn(|| remaining.next_if(|w| w.start_ms < segment_end)).collect();

            if segment_words.is_empty() && !segment.text.trim().is_empty() {
                segment_words.push(Word::from_seconds(segment.text.trim(), segment.start, segment.end));
            }
            utterances.push(Utterance::new(None, segment_words));
        }

        // Words past the last segment end
        if let Some(last) = utterances.last_mut() {
            last.words.extend(remaining);
        }
        utterances
    }
}
