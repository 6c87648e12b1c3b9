use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const METER_FLOOR_DB: f32 = -60.0;

/// Lock-free level cell written from an audio callback and read by the UI.
///
/// One instance exists per pipeline (microphone and assistant playback) so
/// the waveform can show both sides of the conversation without touching
/// either audio path.
#[derive(Clone, Debug)]
pub struct LiveMeter {
    level_bits: Arc<AtomicU32>,
}

impl LiveMeter {
    pub fn new() -> Self {
        Self {
            level_bits: Arc::new(AtomicU32::new(METER_FLOOR_DB.to_bits())),
        }
    }

    pub fn set_db(&self, db: f32) {
        self.level_bits.store(db.to_bits(), Ordering::Relaxed);
    }

    /// Update from one block of samples.
    pub fn observe(&self, samples: &[f32]) {
        self.set_db(rms_db(samples));
    }

    /// Reset to the silence floor, e.g. when a stream stops.
    pub fn reset(&self) {
        self.set_db(METER_FLOOR_DB);
    }

    pub fn level_db(&self) -> f32 {
        f32::from_bits(self.level_bits.load(Ordering::Relaxed))
    }

    /// Level mapped onto [0, 1] for bar/waveform rendering.
    pub fn level_unit(&self) -> f32 {
        ((self.level_db() - METER_FLOOR_DB) / -METER_FLOOR_DB).clamp(0.0, 1.0)
    }
}

impl Default for LiveMeter {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn rms_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return METER_FLOOR_DB;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    let rms = energy.sqrt().max(1e-6);
    20.0 * rms.log10()
}
