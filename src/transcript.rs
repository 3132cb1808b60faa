/*!
 * Provider-independent transcript model and the grouping policy that turns
 * timed words into caption cues.
 *
 * The rule is the same for every provider. Inside each utterance a cue is
 * closed when it holds `max_words` words, when the next word would stretch it
 * past `max_cue_ms`, when the silence before the next word exceeds
 * `max_gap_ms`, or right after a word ending a sentence. Cues never span
 * utterances.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cue_track::{Cue, CueTrack};

/// A recognized word with millisecond timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Word {
    pub fn new(text: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            text: text.into(),
            start_ms,
            end_ms,
        }
    }

    /// Build from provider timings in seconds, truncating to whole milliseconds
    pub fn from_seconds(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self::new(text, seconds_to_ms(start), seconds_to_ms(end))
    }
}

/// A run of words the provider reports as belonging together
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Utterance {
    pub speaker: Option<String>,
    pub words: Vec<Word>,
}

impl Utterance {
    pub fn new(speaker: Option<String>, words: Vec<Word>) -> Self {
        Self { speaker, words }
    }
}

/// Seconds to milliseconds, truncated; negative and NaN become zero
pub fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0) as u64
    } else {
        0
    }
}

/// How words are grouped into cues
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GroupingPolicy {
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    #[serde(default = "default_max_cue_ms")]
    pub max_cue_ms: u64,

    #[serde(default = "default_max_gap_ms")]
    pub max_gap_ms: u64,

    /// Prefix cue text with "Speaker X: " when the provider reports speakers
    #[serde(default)]
    pub speaker_labels: bool,
}

impl Default for GroupingPolicy {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
            max_cue_ms: default_max_cue_ms(),
            max_gap_ms: default_max_gap_ms(),
            speaker_labels: false,
        }
    }
}

fn default_max_words() -> usize {
    7
}

fn default_max_cue_ms() -> u64 {
    3000
}

fn default_max_gap_ms() -> u64 {
    1000
}

fn ends_sentence(word: &str) -> bool {
    word.ends_with(['.', '?', '!'])
}

impl GroupingPolicy {
    /// Group utterances into a sorted, non-overlapping cue track
    pub fn group(&self, utterances: &[Utterance]) -> CueTrack {
        let max_words = self.max_words.max(1);
        let mut cues = Vec::new();

        for utterance in utterances {
            let mut current: Vec<&Word> = Vec::new();

            for word in utterance.words.iter().filter(|w| !w.text.trim().is_empty()) {
                if let (Some(first), Some(last)) = (current.first(), current.last()) {
                    let too_many = current.len() >= max_words;
                    let too_long = word.end_ms.saturating_sub(first.start_ms) > self.max_cue_ms;
                    let gap = word.start_ms.saturating_sub(last.end_ms) > self.max_gap_ms;
                    if too_many || too_long || gap {
                        self.flush(&mut current, utterance.speaker.as_deref(), &mut cues);
                    }
                }

                current.push(word);
                if ends_sentence(word.text.trim()) {
                    self.flush(&mut current, utterance.speaker.as_deref(), &mut cues);
                }
            }

            self.flush(&mut current, utterance.speaker.as_deref(), &mut cues);
        }

        let track = CueTrack::reconciled(cues);
        debug!("Grouped {} utterances into {} cues", utterances.len(), track.len());
        track
    }

    fn flush(&self, current: &mut Vec<&Word>, speaker: Option<&str>, cues: &mut Vec<Cue>) {
        let (Some(first), Some(last)) = (current.first(), current.last()) else {
            return;
        };

        let text = current.iter().map(|w| w.text.trim()).collect::<Vec<_>>().join(" ");
        let text = match speaker {
            Some(speaker) if self.speaker_labels => format!("Speaker {}: {}", speaker, text),
            _ => text,
        };

        // Zero-length groups carry no visible time and are dropped
        if let Ok(cue) = Cue::new(first.start_ms, last.end_ms.max(first.end_ms), text) {
            cues.push(cue);
        }
        current.clear();
    }
}
