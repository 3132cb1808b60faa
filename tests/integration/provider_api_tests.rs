/*!
 * Provider clients against a local stub HTTP server
 */

use std::time::Duration;

use anyhow::Result;
use captionkit::errors::{CaptionError, ErrorKind, ProviderError};
use captionkit::providers::{AudioPayload, ProviderSettings, Transcriber, TranscriptionService};
use captionkit::transcript::GroupingPolicy;
use crate::common;

const GENEROUS_TIMEOUT: Duration = Duration::from_secs(10);

fn audio() -> AudioPayload {
    AudioPayload::new("speech.wav", b"RIFF0000WAVE".to_vec())
}

fn transcriber(service: TranscriptionService, endpoint: &str) -> Transcriber {
    let settings = ProviderSettings::new("test-key")
        .endpoint(endpoint)
        .poll_interval(Duration::from_millis(10));
    Transcriber::new(service, settings)
}

/// Test a successful Deepgram request and what it sends
#[tokio::test]
async fn test_deepgram_transcribe_withStubServer_shouldReturnCues() -> Result<()> {
    let (endpoint, mut requests) =
        common::spawn_stub_server(vec![(200, common::DEEPGRAM_UTTERANCES_JSON.to_string())]).await?;

    let track = transcriber(TranscriptionService::Deepgram, &endpoint)
        .transcribe_to_track(&audio(), &GroupingPolicy::default(), GENEROUS_TIMEOUT)
        .await?;

    assert_eq!(track.len(), 2);
    assert_eq!(track.cues()[0].text(), "Hello there.");

    let request = requests.recv().await.expect("request captured");
    assert!(
        request
            .request_line
            .starts_with("POST /v1/listen?model=nova-2&punctuate=true&utterances=true "),
        "{}",
        request.request_line
    );
    assert_eq!(request.header("authorization"), Some("Token test-key"));
    assert_eq!(request.header("content-type"), Some("audio/wav"));
    assert_eq!(request.body, b"RIFF0000WAVE");
    Ok(())
}

/// Test the AssemblyAI upload, create and poll sequence
#[tokio::test]
async fn test_assemblyai_transcribe_withQueuedJob_shouldPollUntilCompleted() -> Result<()> {
    let (endpoint, mut requests) = common::spawn_stub_server(vec![
        (200, r#"{"upload_url": "https://cdn.example/upload/1"}"#.to_string()),
        (200, r#"{"id": "tx-1", "status": "queued"}"#.to_string()),
        (200, r#"{"id": "tx-1", "status": "processing"}"#.to_string()),
        (200, common::ASSEMBLYAI_COMPLETED_JSON.to_string()),
    ])
    .await?;

    let track = transcriber(TranscriptionService::AssemblyAi, &endpoint)
        .transcribe_to_track(&audio(), &GroupingPolicy::default(), GENEROUS_TIMEOUT)
        .await?;
    assert_eq!(track.len(), 2);

    let upload = requests.recv().await.expect("upload captured");
    assert!(upload.request_line.starts_with("POST /v2/upload "));
    assert_eq!(upload.header("authorization"), Some("test-key"));

    let create = requests.recv().await.expect("create captured");
    assert!(create.request_line.starts_with("POST /v2/transcript "));
    let body: serde_json::Value = serde_json::from_slice(&create.body)?;
    assert_eq!(body["audio_url"], "https://cdn.example/upload/1");
    assert_eq!(body["speech_model"], "best");

    let poll = requests.recv().await.expect("poll captured");
    assert!(poll.request_line.starts_with("GET /v2/transcript/tx-1 "));
    Ok(())
}

/// Test that a failed AssemblyAI job is reported as such
#[tokio::test]
async fn test_assemblyai_transcribe_withErrorStatus_shouldReturnJobFailed() -> Result<()> {
    let (endpoint, _requests) = common::spawn_stub_server(vec![
        (200, r#"{"upload_url": "https://cdn.example/upload/1"}"#.to_string()),
        (200, r#"{"id": "tx-2", "status": "error", "error": "audio too short"}"#.to_string()),
    ])
    .await?;

    let err = transcriber(TranscriptionService::AssemblyAi, &endpoint)
        .transcribe_to_track(&audio(), &GroupingPolicy::default(), GENEROUS_TIMEOUT)
        .await
        .unwrap_err();

    match err {
        CaptionError::Transcription { provider, cause } => {
            assert_eq!(provider, TranscriptionService::AssemblyAi);
            assert!(matches!(cause, ProviderError::JobFailed(ref m) if m == "audio too short"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    Ok(())
}

/// Test that a rejected key surfaces as an authentication error
#[tokio::test]
async fn test_openai_transcribe_withUnauthorized_shouldReturnAuthenticationError() -> Result<()> {
    let (endpoint, mut requests) = common::spawn_stub_server(vec![(
        401,
        r#"{"error": {"message": "Incorrect API key provided"}}"#.to_string(),
    )])
    .await?;

    let err = transcriber(TranscriptionService::OpenAi, &endpoint)
        .transcribe_to_track(&audio(), &GroupingPolicy::default(), GENEROUS_TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transcription);
    assert!(matches!(
        err,
        CaptionError::Transcription {
            provider: TranscriptionService::OpenAi,
            cause: ProviderError::AuthenticationError(_),
        }
    ));

    let request = requests.recv().await.expect("request captured");
    assert!(request.request_line.starts_with("POST /v1/audio/transcriptions "));
    assert_eq!(request.header("authorization"), Some("Bearer test-key"));
    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains("verbose_json"));
    assert!(body.contains("whisper-1"));
    Ok(())
}

/// Test a successful OpenAI request
#[tokio::test]
async fn test_openai_transcribe_withStubServer_shouldReturnCues() -> Result<()> {
    let (endpoint, _requests) =
        common::spawn_stub_server(vec![(200, common::OPENAI_VERBOSE_JSON.to_string())]).await?;

    let track = transcriber(TranscriptionService::OpenAi, &endpoint)
        .transcribe_to_track(&audio(), &GroupingPolicy::default(), GENEROUS_TIMEOUT)
        .await?;

    assert_eq!(track.len(), 2);
    assert_eq!(track.cues()[1].text(), "Second part");
    Ok(())
}

/// Test rate limit mapping
#[tokio::test]
async fn test_deepgram_transcribe_withTooManyRequests_shouldReturnRateLimit() -> Result<()> {
    let (endpoint, _requests) = common::spawn_stub_server(vec![(429, r#"{"err_msg": "slow down"}"#.to_string())]).await?;

    let err = transcriber(TranscriptionService::Deepgram, &endpoint)
        .transcribe_to_track(&audio(), &GroupingPolicy::default(), GENEROUS_TIMEOUT)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CaptionError::Transcription {
            cause: ProviderError::RateLimitExceeded(_),
            ..
        }
    ));
    Ok(())
}

/// Test that an unparsable success body is a parse error
#[tokio::test]
async fn test_deepgram_transcribe_withGarbageBody_shouldReturnParseError() -> Result<()> {
    let (endpoint, _requests) = common::spawn_stub_server(vec![(200, "<html>oops</html>".to_string())]).await?;

    let err = transcriber(TranscriptionService::Deepgram, &endpoint)
        .transcribe_to_track(&audio(), &GroupingPolicy::default(), GENEROUS_TIMEOUT)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CaptionError::Transcription {
            cause: ProviderError::ParseError(_),
            ..
        }
    ));
    Ok(())
}

/// Test that an unreachable endpoint is a connection error
#[tokio::test]
async fn test_transcribe_withClosedPort_shouldReturnConnectionError() -> Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let endpoint = format!("http://{}", listener.local_addr()?);
    drop(listener);

    let err = transcriber(TranscriptionService::Deepgram, &endpoint)
        .transcribe_to_track(&audio(), &GroupingPolicy::default(), GENEROUS_TIMEOUT)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CaptionError::Transcription {
            cause: ProviderError::ConnectionError(_),
            ..
        }
    ));
    Ok(())
}

/// Test that a provider that never answers hits the caller's deadline
#[tokio::test]
async fn test_transcribe_withSilentServer_shouldTimeOut() -> Result<()> {
    let endpoint = common::spawn_silent_server().await?;

    let err = transcriber(TranscriptionService::OpenAi, &endpoint)
        .transcribe_to_track(&audio(), &GroupingPolicy::default(), common::SHORT_TIMEOUT)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CaptionError::Timeout {
            operation: "transcription",
            ..
        }
    ));
    Ok(())
}
