/*!
 * Tests for grouping transcribed words into cues
 */

use captionkit::transcript::{GroupingPolicy, Utterance, Word};

fn words(timings: &[(&str, u64, u64)]) -> Vec<Word> {
    timings.iter().map(|(text, start, end)| Word::new(*text, *start, *end)).collect()
}

fn texts(policy: &GroupingPolicy, utterances: &[Utterance]) -> Vec<String> {
    policy.group(utterances).iter().map(|c| c.text().to_string()).collect()
}

/// Test that groups are cut at the word limit
#[test]
fn test_group_withManyWords_shouldCapWordsPerCue() {
    let stream: Vec<Word> = (0..10u64)
        .map(|i| Word::new(format!("w{}", i), i * 200, i * 200 + 150))
        .collect();
    let policy = GroupingPolicy {
        max_words: 4,
        ..GroupingPolicy::default()
    };

    let track = policy.group(&[Utterance::new(None, stream)]);

    assert_eq!(track.len(), 3);
    assert_eq!(track.cues()[0].text(), "w0 w1 w2 w3");
    assert_eq!((track.cues()[0].start_ms(), track.cues()[0].end_ms()), (0, 750));
    assert_eq!(track.cues()[2].text(), "w8 w9");
}

/// Test that sentence punctuation closes a cue
#[test]
fn test_group_withSentenceEnd_shouldSplit() {
    let utterance = Utterance::new(
        None,
        words(&[("Hi", 0, 200), ("there.", 200, 500), ("How", 600, 800), ("are", 800, 900), ("you?", 900, 1_200)]),
    );

    assert_eq!(texts(&GroupingPolicy::default(), &[utterance]), vec!["Hi there.", "How are you?"]);
}

/// Test that a long pause closes a cue
#[test]
fn test_group_withLongGap_shouldSplit() {
    let utterance = Utterance::new(None, words(&[("before", 0, 400), ("after", 2_000, 2_400)]));
    let track = GroupingPolicy::default().group(&[utterance]);

    assert_eq!(track.len(), 2);
    assert_eq!(track.cues()[1].start_ms(), 2_000);
}

/// Test that a cue never grows past the duration limit
#[test]
fn test_group_withSlowSpeech_shouldCapDuration() {
    let utterance = Utterance::new(
        None,
        words(&[("one", 0, 900), ("two", 900, 1_800), ("three", 1_800, 2_700), ("four", 2_700, 3_600)]),
    );
    let policy = GroupingPolicy::default();
    let track = policy.group(&[utterance]);

    assert_eq!(track.len(), 2);
    assert!(track.iter().all(|c| c.duration_ms() <= policy.max_cue_ms));
}

/// Test that cues never span utterances and carry speaker labels on request
#[test]
fn test_group_withSpeakers_shouldPrefixLabels() {
    let utterances = vec![
        Utterance::new(Some("A".to_string()), words(&[("yes", 0, 300)])),
        Utterance::new(Some("B".to_string()), words(&[("no", 350, 600)])),
    ];
    let policy = GroupingPolicy {
        speaker_labels: true,
        ..GroupingPolicy::default()
    };

    assert_eq!(texts(&policy, &utterances), vec!["Speaker A: yes", "Speaker B: no"]);
    assert_eq!(texts(&GroupingPolicy::default(), &utterances), vec!["yes", "no"]);
}

/// Test that overlapping provider timings come out sorted and non-overlapping
#[test]
fn test_group_withOverlappingUtterances_shouldReconcile() {
    let utterances = vec![
        Utterance::new(Some("B".to_string()), words(&[("late", 1_000, 1_800)])),
        Utterance::new(Some("A".to_string()), words(&[("early", 0, 1_200)])),
    ];
    let track = GroupingPolicy::default().group(&utterances);

    assert_eq!(track.len(), 2);
    assert_eq!(track.cues()[0].text(), "early");
    for pair in track.cues().windows(2) {
        assert!(pair[0].end_ms() <= pair[1].start_ms());
    }
}

/// Test that blank and zero-length words leave no cues behind
#[test]
fn test_group_withDegenerateWords_shouldSkipThem() {
    let utterance = Utterance::new(None, words(&[("  ", 0, 100), ("blip", 500, 500)]));
    assert!(GroupingPolicy::default().group(&[utterance]).is_empty());
}

/// Test that seconds are truncated to whole milliseconds
#[test]
fn test_word_from_seconds_shouldTruncate() {
    let word = Word::from_seconds("x", 1.0009, 2.5);
    assert_eq!((word.start_ms, word.end_ms), (1_000, 2_500));
}
