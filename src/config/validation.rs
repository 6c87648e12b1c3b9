use super::defaults::{
    DEFAULT_ENDPOINT_BASE, MAX_CAPTURE_FRAME_SAMPLES, MIN_CAPTURE_FRAME_SAMPLES,
};
use super::{AppConfig, SessionConfig};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize paths.
    pub fn validate(&mut self) -> Result<()> {
        if self.model.trim().is_empty() {
            bail!("--model must not be empty");
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            bail!(
                "--temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            );
        }

        if !(MIN_CAPTURE_FRAME_SAMPLES..=MAX_CAPTURE_FRAME_SAMPLES)
            .contains(&self.capture_frame_samples)
        {
            bail!(
                "--capture-frame-samples must be between {MIN_CAPTURE_FRAME_SAMPLES} and {MAX_CAPTURE_FRAME_SAMPLES}, got {}",
                self.capture_frame_samples
            );
        }

        if !(1..=1024).contains(&self.frame_channel_capacity) {
            bail!(
                "--frame-channel-capacity must be between 1 and 1024, got {}",
                self.frame_channel_capacity
            );
        }

        if !(0.0..=4.0).contains(&self.playback_gain) {
            bail!(
                "--playback-gain must be between 0.0 and 4.0, got {}",
                self.playback_gain
            );
        }

        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("ws://") && !endpoint.starts_with("wss://") {
                bail!("--endpoint must start with ws:// or wss://, got '{endpoint}'");
            }
        }

        if let Some(case_file) = &mut self.case_file {
            let canonical = case_file.canonicalize().with_context(|| {
                format!("failed to canonicalize case file '{}'", case_file.display())
            })?;
            if !canonical.is_file() {
                bail!("case file '{}' is not a file", canonical.display());
            }
            *case_file = canonical;
        }

        Ok(())
    }

    /// Resolve the directory the case store documents live in.
    pub fn resolved_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("liveguide")
    }

    /// Build the session snapshot. Fails when no API key is available, which
    /// is checked here rather than in validate() so key-less invocations like
    /// --list-input-devices still work.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let api_key = self
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .context("no API key configured; set GEMINI_API_KEY or pass --api-key")?;
        Ok(SessionConfig {
            model: self.model.clone(),
            endpoint_base: self
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT_BASE.to_string()),
            api_key,
            temperature: self.temperature,
            capture_frame_samples: self.capture_frame_samples,
            frame_channel_capacity: self.frame_channel_capacity,
            playback_gain: self.playback_gain,
            input_device: self.input_device.clone(),
        })
    }
}

impl SessionConfig {
    /// Full websocket URL with the key appended the way the service expects.
    pub fn endpoint_url(&self) -> String {
        format!("{}?key={}", self.endpoint_base, self.api_key)
    }
}
