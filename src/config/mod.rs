//! Command-line parsing and validation helpers.

mod defaults;
#[cfg(test)]
mod tests;
mod validation;

use clap::Parser;
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_CAPTURE_FRAME_SAMPLES, DEFAULT_ENDPOINT_BASE, DEFAULT_FRAME_CHANNEL_CAPACITY,
    DEFAULT_MODEL, DEFAULT_PLAYBACK_GAIN, DEFAULT_TEMPERATURE, MAX_CAPTURE_FRAME_SAMPLES,
    MIN_CAPTURE_FRAME_SAMPLES,
};

/// CLI options for the LiveGuide voice assistant. Validated values keep the
/// live session and the case store predictable.
#[derive(Debug, Parser, Clone)]
#[command(about = "LiveGuide voice case assistant", author, version)]
pub struct AppConfig {
    /// API key for the generative AI live endpoint
    #[arg(long = "api-key", env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model identifier sent in the session setup message
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Override the websocket endpoint base URL (testing/self-hosting)
    #[arg(long, env = "LIVEGUIDE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Sampling temperature sent in the session setup message
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Path to the case context JSON file
    #[arg(long = "case-file")]
    pub case_file: Option<PathBuf>,

    /// Directory holding the case store documents (tasks, evidence, ...)
    #[arg(long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Samples per outbound capture frame (16 kHz mono)
    #[arg(
        long = "capture-frame-samples",
        default_value_t = DEFAULT_CAPTURE_FRAME_SAMPLES
    )]
    pub capture_frame_samples: usize,

    /// Capture frame channel capacity before frames are dropped
    #[arg(
        long = "frame-channel-capacity",
        default_value_t = DEFAULT_FRAME_CHANNEL_CAPACITY
    )]
    pub frame_channel_capacity: usize,

    /// Linear gain applied to assistant audio before playback
    #[arg(long = "playback-gain", default_value_t = DEFAULT_PLAYBACK_GAIN)]
    pub playback_gain: f32,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "LIVEGUIDE_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "LIVEGUIDE_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Allow logging case content snippets (debug log only)
    #[arg(
        long = "log-content",
        env = "LIVEGUIDE_LOG_CONTENT",
        default_value_t = false
    )]
    pub log_content: bool,
}

/// Snapshot of the settings the live session needs, detached from the CLI
/// surface so the session thread does not carry the whole config around.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: String,
    pub endpoint_base: String,
    pub api_key: String,
    pub temperature: f32,
    pub capture_frame_samples: usize,
    pub frame_channel_capacity: usize,
    pub playback_gain: f32,
    pub input_device: Option<String>,
}
