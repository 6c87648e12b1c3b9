//! Assistant-audio playback with a logical scheduling cursor.
//!
//! Decoded buffers are chained back-to-back in sample time: each new buffer
//! starts at `max(cursor, position)` and advances the cursor by its length,
//! so playback is gapless and in order no matter how the network jitters
//! their arrival. Barge-in interruption drops every queued buffer and resets
//! the cursor to zero, which makes the next buffer start at "now".

use super::resample::resample;
use super::{LiveMeter, PLAYBACK_RATE};
use crate::log_debug;
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct ScheduledBuffer {
    start: u64,
    samples: Vec<f32>,
}

impl ScheduledBuffer {
    fn end(&self) -> u64 {
        self.start + self.samples.len() as u64
    }
}

/// Sample-clock scheduler shared between the session loop (schedules,
/// interrupts) and the output callback (fills).
///
/// All times are mono sample counts at the output device rate. `position` is
/// the device's playhead and only ever moves forward; `cursor` is the
/// earliest start for the next buffer and is reset to zero by interruption.
pub struct PlaybackScheduler {
    cursor: u64,
    position: u64,
    gain: f32,
    queue: VecDeque<ScheduledBuffer>,
    finished: u64,
}

impl PlaybackScheduler {
    pub fn new(gain: f32) -> Self {
        Self {
            cursor: 0,
            position: 0,
            gain,
            queue: VecDeque::new(),
            finished: 0,
        }
    }

    /// Queue one decoded buffer for gapless playback. Returns its start time.
    pub fn schedule(&mut self, samples: Vec<f32>) -> u64 {
        let start = self.cursor.max(self.position);
        if samples.is_empty() {
            return start;
        }
        self.cursor = start + samples.len() as u64;
        self.queue.push_back(ScheduledBuffer { start, samples });
        start
    }

    /// Barge-in: stop and discard every queued buffer, reset the cursor so
    /// the next buffer starts immediately. Returns how many were discarded.
    pub fn interrupt(&mut self) -> usize {
        let discarded = self.queue.len();
        self.queue.clear();
        self.cursor = 0;
        discarded
    }

    /// Drain into one interleaved output block. Silence where nothing is
    /// scheduled; buffers that end inside the block leave the live set.
    pub fn fill(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames = out.len() / channels;
        for frame_idx in 0..frames {
            let t = self.position + frame_idx as u64;
            while let Some(front) = self.queue.front() {
                if front.end() <= t {
                    self.queue.pop_front();
                    self.finished += 1;
                } else {
                    break;
                }
            }
            let sample = match self.queue.front() {
                Some(front) if front.start <= t => {
                    front.samples[(t - front.start) as usize] * self.gain
                }
                _ => 0.0,
            };
            for ch in 0..channels {
                out[frame_idx * channels + ch] = sample;
            }
        }
        self.position += frames as u64;
        // Sweep buffers fully consumed by this block.
        while let Some(front) = self.queue.front() {
            if front.end() <= self.position {
                self.queue.pop_front();
                self.finished += 1;
            } else {
                break;
            }
        }
    }

    /// Buffers scheduled but not yet finished.
    pub fn live_buffers(&self) -> usize {
        self.queue.len()
    }

    /// Buffers that reached their natural end.
    pub fn finished_buffers(&self) -> u64 {
        self.finished
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn position(&self) -> u64 {
        self.position
    }
}

/// Output stream plus the scheduler it drains.
///
/// Like the capture stream, the CPAL handle is not `Send` and lives on the
/// session worker thread for the whole session.
pub struct PlaybackHandle {
    _stream: cpal::Stream,
    scheduler: Arc<Mutex<PlaybackScheduler>>,
    device_rate: u32,
}

impl PlaybackHandle {
    /// Open the default output device and start the (initially silent)
    /// stream.
    pub fn open(gain: f32, meter: LiveMeter) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no default output device available")?;
        let device_name = device
            .name()
            .unwrap_or_else(|_| "unknown output device".to_string());

        let default_config = device
            .default_output_config()
            .with_context(|| format!("failed to query output format for '{device_name}'"))?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let device_rate = device_config.sample_rate.0;
        let channels = usize::from(device_config.channels.max(1));

        log_debug(&format!(
            "playback config: device={device_name} format={format:?} sample_rate={device_rate}Hz channels={channels}"
        ));

        let scheduler = Arc::new(Mutex::new(PlaybackScheduler::new(gain)));
        let err_fn = |err| log_debug(&format!("playback_stream_error: {err}"));

        let stream = match format {
            SampleFormat::F32 => {
                let scheduler = scheduler.clone();
                let meter = meter.clone();
                device.build_output_stream(
                    &device_config,
                    move |data: &mut [f32], _| {
                        if let Ok(mut sched) = scheduler.lock() {
                            sched.fill(data, channels);
                        } else {
                            data.fill(0.0);
                        }
                        meter.observe(data);
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let scheduler = scheduler.clone();
                let meter = meter.clone();
                let mut scratch: Vec<f32> = Vec::new();
                device.build_output_stream(
                    &device_config,
                    move |data: &mut [i16], _| {
                        scratch.resize(data.len(), 0.0);
                        scratch.fill(0.0);
                        if let Ok(mut sched) = scheduler.lock() {
                            sched.fill(&mut scratch, channels);
                        }
                        meter.observe(&scratch);
                        for (dst, src) in data.iter_mut().zip(&scratch) {
                            *dst = (src.clamp(-1.0, 1.0) * 32_767.0) as i16;
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let scheduler = scheduler.clone();
                let meter = meter.clone();
                let mut scratch: Vec<f32> = Vec::new();
                device.build_output_stream(
                    &device_config,
                    move |data: &mut [u16], _| {
                        scratch.resize(data.len(), 0.0);
                        scratch.fill(0.0);
                        if let Ok(mut sched) = scheduler.lock() {
                            sched.fill(&mut scratch, channels);
                        }
                        meter.observe(&scratch);
                        for (dst, src) in data.iter_mut().zip(&scratch) {
                            *dst = ((src.clamp(-1.0, 1.0) * 32_767.0) + 32_768.0) as u16;
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(anyhow!("unsupported output sample format: {other:?}")),
        };

        stream
            .play()
            .with_context(|| format!("failed to start playback on '{device_name}'"))?;

        Ok(Self {
            _stream: stream,
            scheduler,
            device_rate,
        })
    }

    /// Schedule one decoded 24 kHz wire buffer, resampled to the device rate.
    pub fn schedule_wire(&self, samples: Vec<f32>) {
        let converted = if self.device_rate == PLAYBACK_RATE {
            samples
        } else {
            resample(&samples, PLAYBACK_RATE, self.device_rate)
        };
        if let Ok(mut sched) = self.scheduler.lock() {
            sched.schedule(converted);
        }
    }

    /// Flush queued audio on barge-in or teardown.
    pub fn interrupt(&self) -> usize {
        self.scheduler
            .lock()
            .map(|mut sched| sched.interrupt())
            .unwrap_or(0)
    }

    pub fn live_buffers(&self) -> usize {
        self.scheduler
            .lock()
            .map(|sched| sched.live_buffers())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(len: usize, value: f32) -> Vec<f32> {
        vec![value; len]
    }

    #[test]
    fn buffers_chain_back_to_back_regardless_of_arrival_timing() {
        let mut sched = PlaybackScheduler::new(1.0);
        // Simulate arrival jitter: the playhead moves between schedules.
        let start1 = sched.schedule(buffer(24_000, 0.1)); // 1.0s at 24 kHz
        let mut block = vec![0.0f32; 1200]; // 50 ms elapses
        sched.fill(&mut block, 1);
        let start2 = sched.schedule(buffer(36_000, 0.2)); // 1.5s
        assert_eq!(start1, 0);
        assert_eq!(start2, start1 + 24_000, "no gap, no overlap");
        assert_eq!(sched.cursor(), start2 + 36_000);
    }

    #[test]
    fn late_buffer_starts_at_the_playhead() {
        let mut sched = PlaybackScheduler::new(1.0);
        sched.schedule(buffer(100, 0.1));
        let mut block = vec![0.0f32; 500]; // first buffer long gone
        sched.fill(&mut block, 1);
        let start = sched.schedule(buffer(100, 0.2));
        assert_eq!(start, 500, "cursor behind the playhead snaps to now");
    }

    #[test]
    fn interruption_clears_live_set_and_resets_cursor() {
        let mut sched = PlaybackScheduler::new(1.0);
        sched.schedule(buffer(1000, 0.1));
        sched.schedule(buffer(1000, 0.2));
        sched.schedule(buffer(1000, 0.3));
        let mut block = vec![0.0f32; 100];
        sched.fill(&mut block, 1);
        assert_eq!(sched.live_buffers(), 3);

        let discarded = sched.interrupt();
        assert_eq!(discarded, 3);
        assert_eq!(sched.live_buffers(), 0);
        assert_eq!(sched.cursor(), 0);

        // Next buffer starts at "now", not at the stale future time.
        let start = sched.schedule(buffer(1000, 0.4));
        assert_eq!(start, sched.position());
    }

    #[test]
    fn fill_plays_samples_then_silence() {
        let mut sched = PlaybackScheduler::new(1.0);
        sched.schedule(buffer(4, 0.5));
        let mut block = vec![0.0f32; 8];
        sched.fill(&mut block, 1);
        assert_eq!(block, vec![0.5, 0.5, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(sched.live_buffers(), 0, "consumed buffer leaves the set");
        assert_eq!(sched.finished_buffers(), 1);
    }

    #[test]
    fn fill_applies_gain_and_interleaves_channels() {
        let mut sched = PlaybackScheduler::new(0.5);
        sched.schedule(buffer(2, 1.0));
        let mut block = vec![0.0f32; 4]; // 2 frames, stereo
        sched.fill(&mut block, 2);
        assert_eq!(block, vec![0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn gapless_across_many_jittered_fills() {
        let mut sched = PlaybackScheduler::new(1.0);
        let durations = [240usize, 2400, 480, 24_000, 960];
        let mut expected_start: Option<u64> = None;
        for (i, &len) in durations.iter().enumerate() {
            // Vary how much the playhead advances between arrivals; the
            // cursor stays ahead so starts stay contiguous after the first.
            let mut block = vec![0.0f32; 37 * (i + 1)];
            sched.fill(&mut block, 1);
            let start = sched.schedule(buffer(len, 0.1));
            if let Some(expected) = expected_start {
                assert_eq!(start, expected, "buffer {i} must chain exactly");
            } else {
                assert_eq!(start, sched.position(), "first buffer starts at now");
            }
            expected_start = Some(start + len as u64);
        }
    }

    #[test]
    fn empty_buffer_does_not_advance_cursor() {
        let mut sched = PlaybackScheduler::new(1.0);
        sched.schedule(Vec::new());
        assert_eq!(sched.cursor(), 0);
        assert_eq!(sched.live_buffers(), 0);
    }
}
