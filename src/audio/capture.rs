//! Continuous microphone capture via CPAL.
//!
//! Opens the device at its native format, downmixes to mono, and hands
//! fixed-size blocks to the session loop, which resamples them to the 16 kHz
//! wire rate. Capture runs for the whole session; mute is a gate, not a stop.

use super::dispatch::FrameDispatcher;
use super::pcm;
use super::resample::{adjust_frame_length, resample};
use super::{LiveMeter, CAPTURE_RATE};
use crate::log_debug;
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{channel, Receiver, Sender};

/// Counters the capture pipeline exposes for observability. Frame loss is
/// expected under backpressure, so it is counted rather than treated as an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureMetrics {
    pub frames_dropped: usize,
    pub callback_errors: usize,
}

/// Live microphone stream feeding the session loop.
///
/// The CPAL stream is not `Send`; the whole struct stays on the thread that
/// opened it, which is the session worker. Dropping it stops the device.
pub struct CaptureStream {
    _stream: cpal::Stream,
    device_rate: u32,
    wire_frame_samples: usize,
    dropped: Arc<AtomicUsize>,
    callback_errors: Arc<AtomicUsize>,
}

impl CaptureStream {
    /// List microphone names so the CLI can expose a human-friendly selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Open the microphone and start streaming immediately.
    ///
    /// Returns the stream handle plus the receiving end of the bounded frame
    /// channel. Frames arrive at the device rate, `wire_frame_samples` scaled
    /// accordingly; [`CaptureStream::to_wire_frame`] converts them for
    /// transmission.
    pub fn open(
        preferred_device: Option<&str>,
        wire_frame_samples: usize,
        channel_capacity: usize,
        muted: Arc<AtomicBool>,
        meter: LiveMeter,
    ) -> Result<(Self, Receiver<Vec<f32>>)> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{name}' not found"))?
            }
            None => host
                .default_input_device()
                .context("no default input device available")?,
        };
        let device_name = device
            .name()
            .unwrap_or_else(|_| "unknown input device".to_string());

        let default_config = device
            .default_input_config()
            .with_context(|| format!("failed to query input format for '{device_name}'. {}", mic_permission_hint()))?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let device_rate = device_config.sample_rate.0;
        let channels = usize::from(device_config.channels.max(1));

        log_debug(&format!(
            "capture config: device={device_name} format={format:?} sample_rate={device_rate}Hz channels={channels}"
        ));

        // Frame size at the device rate that resamples down to exactly one
        // wire frame.
        let device_frame_samples = ((device_rate as u64 * wire_frame_samples as u64)
            / u64::from(CAPTURE_RATE))
        .max(1) as usize;

        let (sender, receiver): (Sender<Vec<f32>>, Receiver<Vec<f32>>) =
            channel(channel_capacity.max(1));
        let dropped = Arc::new(AtomicUsize::new(0));
        let callback_errors = Arc::new(AtomicUsize::new(0));
        let dispatcher = Arc::new(Mutex::new(FrameDispatcher::new(
            device_frame_samples,
            sender,
            dropped.clone(),
            muted,
            meter,
        )));

        let errors = callback_errors.clone();
        let err_fn = move |err| {
            errors.fetch_add(1, Ordering::Relaxed);
            log_debug(&format!("capture_stream_error: {err}"));
        };

        let stream = match format {
            SampleFormat::F32 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| sample);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| sample as f32 / 32_768.0);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| {
                                (sample as f32 - 32_768.0) / 32_768.0
                            });
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(anyhow!("unsupported sample format: {other:?}")),
        };

        stream
            .play()
            .with_context(|| format!("failed to start capture on '{device_name}'. {}", mic_permission_hint()))?;

        Ok((
            Self {
                _stream: stream,
                device_rate,
                wire_frame_samples,
                dropped,
                callback_errors,
            },
            receiver,
        ))
    }

    /// Resample one device-rate frame to the 16 kHz wire rate and convert to
    /// PCM16, fixed to exactly one wire frame of samples.
    pub fn to_wire_frame(&self, frame: Vec<f32>) -> Vec<i16> {
        let converted = if self.device_rate == CAPTURE_RATE {
            frame
        } else {
            resample(&frame, self.device_rate, CAPTURE_RATE)
        };
        pcm::floats_to_i16(&adjust_frame_length(converted, self.wire_frame_samples))
    }

    pub fn metrics(&self) -> CaptureMetrics {
        CaptureMetrics {
            frames_dropped: self.dropped.load(Ordering::Relaxed),
            callback_errors: self.callback_errors.load(Ordering::Relaxed),
        }
    }
}

fn mic_permission_hint() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "macOS: System Settings > Privacy & Security > Microphone (enable your terminal)."
    }
    #[cfg(target_os = "linux")]
    {
        "Linux: check PipeWire/PulseAudio permissions and ensure the device is not muted."
    }
    #[cfg(target_os = "windows")]
    {
        "Windows: Settings > Privacy & Security > Microphone (allow access for your terminal)."
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "Check OS microphone permissions."
    }
}
