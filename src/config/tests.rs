use super::*;
use clap::Parser;

fn parse(args: &[&str]) -> AppConfig {
    let mut full = vec!["liveguide"];
    full.extend_from_slice(args);
    AppConfig::parse_from(full)
}

#[test]
fn defaults_are_valid() {
    let mut config = parse(&[]);
    config.validate().expect("defaults should validate");
    assert_eq!(config.model, DEFAULT_MODEL);
    assert_eq!(config.capture_frame_samples, DEFAULT_CAPTURE_FRAME_SAMPLES);
    assert_eq!(
        config.frame_channel_capacity,
        DEFAULT_FRAME_CHANNEL_CAPACITY
    );
}

#[test]
fn temperature_out_of_range_is_rejected() {
    let mut config = parse(&["--temperature", "3.5"]);
    let err = config.validate().expect_err("3.5 is out of range");
    assert!(err.to_string().contains("--temperature"), "{err}");
}

#[test]
fn tiny_capture_frames_are_rejected() {
    let mut config = parse(&["--capture-frame-samples", "16"]);
    let err = config.validate().expect_err("16 samples is too small");
    assert!(err.to_string().contains("--capture-frame-samples"), "{err}");
}

#[test]
fn zero_channel_capacity_is_rejected() {
    let mut config = parse(&["--frame-channel-capacity", "0"]);
    let err = config.validate().expect_err("capacity 0 cannot buffer");
    assert!(err.to_string().contains("--frame-channel-capacity"), "{err}");
}

#[test]
fn endpoint_must_be_websocket_scheme() {
    let mut config = parse(&["--endpoint", "https://example.com/live"]);
    let err = config.validate().expect_err("https is not a ws scheme");
    assert!(err.to_string().contains("ws://"), "{err}");
}

#[test]
fn endpoint_override_is_accepted() {
    let mut config = parse(&["--endpoint", "ws://127.0.0.1:9090/live"]);
    config.validate().expect("ws:// endpoints are fine");
}

#[test]
fn missing_case_file_fails_validation() {
    let mut config = parse(&["--case-file", "/definitely/not/here.json"]);
    assert!(config.validate().is_err());
}

#[test]
fn session_config_requires_api_key() {
    let mut config = parse(&[]);
    config.api_key = None;
    config.validate().expect("defaults should validate");
    let err = config.session_config().expect_err("no key configured");
    assert!(err.to_string().contains("API key"), "{err}");
}

#[test]
fn blank_api_key_counts_as_missing() {
    let mut config = parse(&[]);
    config.api_key = Some("   ".to_string());
    assert!(config.session_config().is_err());
}

#[test]
fn session_config_builds_endpoint_url() {
    let mut config = parse(&["--endpoint", "wss://example.test/bidi"]);
    config.api_key = Some("k-123".to_string());
    config.validate().expect("valid");
    let session = config.session_config().expect("key present");
    assert_eq!(session.endpoint_url(), "wss://example.test/bidi?key=k-123");
}

#[test]
fn data_dir_override_wins() {
    let config = parse(&["--data-dir", "/tmp/liveguide-test-data"]);
    assert_eq!(
        config.resolved_data_dir(),
        std::path::PathBuf::from("/tmp/liveguide-test-data")
    );
}
