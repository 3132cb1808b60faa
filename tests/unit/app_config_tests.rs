/*!
 * Tests for application configuration
 */

use std::time::Duration;

use anyhow::Result;
use captionkit::app_config::{Config, LogLevel, ProviderConfig};
use captionkit::errors::ErrorKind;
use captionkit::providers::TranscriptionService;
use crate::common;

/// Test that the default configuration is valid
#[test]
fn test_default_config_shouldValidate() -> Result<()> {
    let config = Config::default();
    config.validate()?;

    assert_eq!(config.transcription.service, TranscriptionService::AssemblyAi);
    assert_eq!(config.transcription.available_providers.len(), 3);
    assert_eq!(config.render.ffmpeg_path, "ffmpeg");
    assert_eq!(config.render.probe_timeout(), Duration::from_secs(30));
    assert_eq!(config.log_level, LogLevel::Info);
    Ok(())
}

/// Test saving and loading a configuration
#[test]
fn test_save_and_load_withModifiedConfig_shouldPreserveValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.style.font = "Arial".to_string();
    config.transcription.service = TranscriptionService::Deepgram;
    config.grouping.max_words = 5;
    config.render.preset = "veryfast".to_string();
    config.save(&path)?;

    let loaded = Config::load(&path)?;
    assert_eq!(loaded.style.font, "Arial");
    assert_eq!(loaded.transcription.service, TranscriptionService::Deepgram);
    assert_eq!(loaded.grouping.max_words, 5);
    assert_eq!(loaded.render.preset, "veryfast");
    Ok(())
}

/// Test that a sparse config file is completed with defaults
#[test]
fn test_load_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "style": {"animation": "none"},
            "transcription": {
                "service": "openai",
                "available_providers": [{"type": "openai", "api_key": "sk-test", "timeout_secs": 30}]
            },
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::load(&path)?;
    config.validate()?;

    assert_eq!(config.style.animation, "none");
    assert_eq!(config.style.font, "Montserrat");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.transcription.timeout(TranscriptionService::OpenAi), Duration::from_secs(30));
    assert_eq!(
        config.transcription.get_api_key(TranscriptionService::OpenAi).as_deref(),
        Some("sk-test")
    );
    assert!(config.transcription.get_provider_config(TranscriptionService::Deepgram).is_none());
    Ok(())
}

/// Test that a missing config file is a not found error
#[test]
fn test_load_withMissingFile_shouldReturnNotFound() {
    let err = Config::load("no/such/conf.json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// Test that an unparsable config file is a configuration error
#[test]
fn test_load_withInvalidJson_shouldReturnConfigError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    let err = Config::load(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    Ok(())
}

/// Test that an unknown service name in the file is rejected
#[test]
fn test_load_withUnknownService_shouldReturnConfigError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", r#"{"transcription": {"service": "whisperx"}}"#)?;

    assert_eq!(Config::load(&path).unwrap_err().kind(), ErrorKind::Config);
    Ok(())
}

/// Test that validation surfaces style violations
#[test]
fn test_validate_withInvalidStyle_shouldReturnInvalidStyle() {
    let mut config = Config::default();
    config.style.outline_width = -1.0;
    config.style.animation = "spin".to_string();

    let err = config.validate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidStyle);
    assert_eq!(err.style_fields(), vec!["outline_width", "animation"]);
}

/// Test that zero timeouts and limits are rejected
#[test]
fn test_validate_withZeroValues_shouldReturnConfigError() {
    let mut config = Config::default();
    config.render.timeout_secs = 0;
    assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Config);

    let mut config = Config::default();
    config.render.probe_timeout_secs = 0;
    assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Config);

    let mut config = Config::default();
    config.grouping.max_words = 0;
    assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Config);

    let mut config = Config::default();
    config.transcription.available_providers[1].timeout_secs = 0;
    assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Config);
}

/// Test that an explicit API key wins over config and environment
#[test]
fn test_provider_settings_withExplicitKey_shouldUseIt() -> Result<()> {
    let mut config = Config::default();
    let mut provider = ProviderConfig::new(TranscriptionService::Deepgram);
    provider.api_key = "from-config".to_string();
    provider.endpoint = "http://127.0.0.1:1".to_string();
    config.transcription.available_providers = vec![provider];
    config.transcription.diarization.enabled = true;

    let settings = config
        .transcription
        .provider_settings(TranscriptionService::Deepgram, Some("explicit"))?;
    assert_eq!(settings.api_key, "explicit");
    assert_eq!(settings.endpoint, "http://127.0.0.1:1");
    assert_eq!(settings.model, "nova-2");
    assert!(settings.diarize);
    assert_eq!(settings.max_speakers, Some(3));

    let settings = config.transcription.provider_settings(TranscriptionService::Deepgram, None)?;
    assert_eq!(settings.api_key, "from-config");
    Ok(())
}

/// Test that a missing API key is a configuration error
#[test]
fn test_provider_settings_withoutKey_shouldReturnConfigError() {
    let service = TranscriptionService::Deepgram;
    if std::env::var(service.api_key_env_var()).is_ok() {
        // Key provided by the environment
        return;
    }

    let config = Config::default();
    let err = config.transcription.provider_settings(service, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(err.to_string().contains("DEEPGRAM_API_KEY"));
}

/// Test log level mapping
#[test]
fn test_log_level_to_level_filter_shouldMatch() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
