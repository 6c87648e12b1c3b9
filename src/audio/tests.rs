use super::pcm;
use super::resample::{
    adjust_frame_length, basic_resample, design_low_pass, downsampling_tap_count, low_pass_fir,
    resample, resample_linear,
};
use super::{PlaybackScheduler, CAPTURE_RATE, PLAYBACK_RATE};
use std::f32::consts::PI;

fn sine(rate: u32, freq: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (2.0 * PI * freq * i as f32 / rate as f32).sin())
        .collect()
}

#[test]
fn resample_is_identity_at_equal_rates() {
    let input = sine(CAPTURE_RATE, 440.0, 1024);
    assert_eq!(resample(&input, CAPTURE_RATE, CAPTURE_RATE), input);
}

#[test]
fn resample_handles_empty_input() {
    assert!(resample(&[], 48_000, CAPTURE_RATE).is_empty());
}

#[test]
fn resample_zero_rate_passes_through() {
    let input = vec![0.25f32; 64];
    assert_eq!(resample(&input, 0, CAPTURE_RATE), input);
    assert_eq!(resample(&input, CAPTURE_RATE, 0), input);
}

#[test]
fn downsampling_halves_length_within_tolerance() {
    let input = sine(48_000, 440.0, 4800);
    let output = basic_resample(&input, 48_000, CAPTURE_RATE);
    let expected = 4800 / 3;
    let diff = output.len().abs_diff(expected);
    assert!(diff <= 2, "expected ~{expected} samples, got {}", output.len());
}

#[test]
fn upsampling_grows_length_within_tolerance() {
    let input = sine(PLAYBACK_RATE, 440.0, 2400);
    let output = basic_resample(&input, PLAYBACK_RATE, 48_000);
    let diff = output.len().abs_diff(4800);
    assert!(diff <= 2, "expected ~4800 samples, got {}", output.len());
}

#[test]
fn playback_to_device_rate_preserves_duration() {
    // One second of wire audio should stay one second at the device rate.
    let input = sine(PLAYBACK_RATE, 220.0, PLAYBACK_RATE as usize);
    let output = resample(&input, PLAYBACK_RATE, 44_100);
    let diff = output.len().abs_diff(44_100);
    assert!(diff <= 44, "expected ~44100 samples, got {}", output.len());
}

#[test]
fn linear_resampler_interpolates_midpoints() {
    let output = resample_linear(&[0.0, 1.0], 2.0);
    assert_eq!(output.len(), 4);
    assert!((output[1] - 0.5).abs() < 1e-6);
}

#[test]
fn tap_count_is_odd_and_bounded() {
    for &(src, dst) in &[(48_000u32, 16_000u32), (44_100, 16_000), (96_000, 24_000)] {
        let taps = downsampling_tap_count(src, dst);
        assert_eq!(taps % 2, 1, "taps must be odd for a symmetric FIR");
        assert!(taps <= 129);
    }
}

#[test]
fn low_pass_preserves_dc() {
    let input = vec![1.0f32; 512];
    let taps = downsampling_tap_count(48_000, 16_000);
    let output = low_pass_fir(&input, 48_000, 16_000, taps);
    // Away from the edges the normalized filter passes a constant unchanged.
    for sample in &output[taps..output.len() - taps] {
        assert!((sample - 1.0).abs() < 1e-3);
    }
}

#[test]
fn low_pass_coefficients_are_normalized() {
    let coeffs = design_low_pass(0.25, 33);
    let sum: f32 = coeffs.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
}

#[test]
fn adjust_frame_length_pads_and_truncates() {
    assert_eq!(adjust_frame_length(vec![1.0, 2.0], 4), vec![1.0, 2.0, 2.0, 2.0]);
    assert_eq!(adjust_frame_length(vec![1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
    assert_eq!(adjust_frame_length(Vec::new(), 2), vec![0.0, 0.0]);
}

#[test]
fn wire_frame_survives_transport_round_trip() {
    // Capture frame -> base64 text -> decoded playback floats, the full
    // outbound-then-inbound transform chain.
    let frame = sine(CAPTURE_RATE, 300.0, 4096);
    let encoded = pcm::encode_frame(&pcm::floats_to_i16(&frame));
    let decoded = pcm::decode_base64_audio(&encoded).expect("valid base64");
    assert_eq!(decoded.len(), frame.len());
    for (orig, round) in frame.iter().zip(&decoded) {
        assert!((orig - round).abs() <= 2.0 / 32_768.0);
    }
}

#[test]
fn scheduler_start_times_are_cumulative_durations() {
    // Durations in device samples; start k+1 == start k + len k exactly.
    let mut sched = PlaybackScheduler::new(1.0);
    let lens = [24_000usize, 36_000, 12_000, 6_000];
    let mut starts = Vec::new();
    for &len in &lens {
        starts.push(sched.schedule(vec![0.1; len]));
    }
    for window in starts.windows(2).zip(&lens) {
        let (pair, len) = window;
        assert_eq!(pair[1], pair[0] + *len as u64);
    }
}

#[test]
fn scheduler_silence_between_turns_does_not_reorder() {
    let mut sched = PlaybackScheduler::new(1.0);
    sched.schedule(vec![0.1; 100]);
    let mut block = vec![0.0f32; 400];
    sched.fill(&mut block, 1);
    // A second assistant turn after idle silence starts at the playhead and
    // still chains internally.
    let start_a = sched.schedule(vec![0.2; 50]);
    let start_b = sched.schedule(vec![0.3; 50]);
    assert_eq!(start_a, 400);
    assert_eq!(start_b, 450);
}
