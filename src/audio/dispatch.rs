use super::LiveMeter;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::mpsc::{error::TrySendError, Sender};

/// Downmix multi-channel input to mono while applying the provided converter
/// so the wire sees a single channel regardless of the microphone layout.
pub(super) fn append_downmixed_samples<T, F>(
    buf: &mut Vec<f32>,
    data: &[T],
    channels: usize,
    mut convert: F,
) where
    T: Copy,
    F: FnMut(T) -> f32,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(&mut convert));
        return;
    }

    // Average each interleaved frame to produce a mono representation.
    let mut acc = 0.0f32;
    let mut count = 0usize;
    for sample in data.iter().copied() {
        acc += convert(sample);
        count += 1;
        if count == channels {
            buf.push(acc / channels as f32);
            acc = 0.0;
            count = 0;
        }
    }
    if count > 0 {
        buf.push(acc / count as f32);
    }
}

/// Chops the microphone callback's blocks into fixed-size frames for the
/// session loop. Best-effort by design: a full channel or an active mute
/// drops audio instead of buffering it, and drops are only counted.
pub(super) struct FrameDispatcher {
    frame_samples: usize,
    pending: Vec<f32>,
    scratch: Vec<f32>,
    sender: Sender<Vec<f32>>,
    dropped: Arc<AtomicUsize>,
    muted: Arc<AtomicBool>,
    meter: LiveMeter,
}

impl FrameDispatcher {
    pub(super) fn new(
        frame_samples: usize,
        sender: Sender<Vec<f32>>,
        dropped: Arc<AtomicUsize>,
        muted: Arc<AtomicBool>,
        meter: LiveMeter,
    ) -> Self {
        Self {
            frame_samples: frame_samples.max(1),
            pending: Vec::with_capacity(frame_samples),
            scratch: Vec::new(),
            sender,
            dropped,
            muted,
            meter,
        }
    }

    pub(super) fn push<T, F>(&mut self, data: &[T], channels: usize, convert: F)
    where
        T: Copy,
        F: FnMut(T) -> f32,
    {
        self.scratch.clear();
        append_downmixed_samples(&mut self.scratch, data, channels, convert);

        // The level tap sees every block, muted or not; the waveform keeps
        // moving so the user can tell the microphone is alive.
        self.meter.observe(&self.scratch);

        if self.muted.load(Ordering::Relaxed) {
            // Muted blocks never reach the wire. Pending audio from before
            // the mute is discarded too, so unmuting cannot leak a stale
            // partial frame.
            self.pending.clear();
            return;
        }

        self.pending.extend_from_slice(&self.scratch);

        while self.pending.len() >= self.frame_samples {
            let frame: Vec<f32> = self.pending.drain(..self.frame_samples).collect();
            if let Err(err) = self.sender.try_send(frame) {
                match err {
                    TrySendError::Full(_) => {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    TrySendError::Closed(_) => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher(
        frame_samples: usize,
        capacity: usize,
    ) -> (
        FrameDispatcher,
        tokio::sync::mpsc::Receiver<Vec<f32>>,
        Arc<AtomicUsize>,
        Arc<AtomicBool>,
    ) {
        let (tx, rx) = tokio::sync::mpsc::channel(capacity);
        let dropped = Arc::new(AtomicUsize::new(0));
        let muted = Arc::new(AtomicBool::new(false));
        let dispatcher = FrameDispatcher::new(
            frame_samples,
            tx,
            dropped.clone(),
            muted.clone(),
            LiveMeter::new(),
        );
        (dispatcher, rx, dropped, muted)
    }

    #[test]
    fn downmix_averages_stereo_pairs() {
        let mut buf = Vec::new();
        append_downmixed_samples(&mut buf, &[1.0f32, 0.0, -1.0, 0.0], 2, |s| s);
        assert_eq!(buf, vec![0.5, -0.5]);
    }

    #[test]
    fn emits_fixed_size_frames() {
        let (mut dispatcher, mut rx, dropped, _) = dispatcher(4, 8);
        dispatcher.push(&[0.1f32; 10], 1, |s| s);
        let first = rx.try_recv().expect("one full frame");
        let second = rx.try_recv().expect("two full frames");
        assert_eq!(first.len(), 4);
        assert_eq!(second.len(), 4);
        assert!(rx.try_recv().is_err(), "remainder stays pending");
        assert_eq!(dropped.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn full_channel_drops_and_counts() {
        let (mut dispatcher, mut rx, dropped, _) = dispatcher(2, 1);
        dispatcher.push(&[0.0f32; 8], 1, |s| s);
        assert_eq!(dropped.load(Ordering::Relaxed), 3);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn muted_blocks_never_reach_the_channel() {
        let (mut dispatcher, mut rx, dropped, muted) = dispatcher(4, 8);
        muted.store(true, Ordering::Relaxed);
        dispatcher.push(&[0.5f32; 16], 1, |s| s);
        assert!(rx.try_recv().is_err());
        // Mute is not an error condition, so nothing is counted as dropped.
        assert_eq!(dropped.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn unmuting_does_not_leak_pre_mute_audio() {
        let (mut dispatcher, mut rx, _, muted) = dispatcher(4, 8);
        dispatcher.push(&[0.9f32; 3], 1, |s| s); // partial frame pending
        muted.store(true, Ordering::Relaxed);
        dispatcher.push(&[0.9f32; 3], 1, |s| s); // discards pending too
        muted.store(false, Ordering::Relaxed);
        dispatcher.push(&[0.1f32; 4], 1, |s| s);
        let frame = rx.try_recv().expect("post-unmute frame");
        assert!(frame.iter().all(|&s| (s - 0.1).abs() < f32::EPSILON));
    }
}
