//! Sample-rate conversion between device rates and the fixed wire rates.
//!
//! The capture path collapses whatever the microphone produces down to
//! 16 kHz; the playback path expands 24 kHz assistant audio to whatever the
//! output device runs at. Both go through the same converter, parameterized
//! by source and destination rate.

#[cfg(feature = "high-quality-audio")]
use crate::log_debug;
#[cfg(feature = "high-quality-audio")]
use anyhow::{anyhow, Result};
#[cfg(feature = "high-quality-audio")]
use rubato::{InterpolationParameters, InterpolationType, Resampler, SincFixedIn, WindowFunction};
use std::cmp::Ordering as CmpOrdering;
use std::f32::consts::PI;
#[cfg(feature = "high-quality-audio")]
use std::sync::atomic::{AtomicBool, Ordering};

// Practical hardware range; anything outside is treated as a driver bug and
// passed through unconverted.
pub(super) const MIN_RATE: u32 = 2_000;
pub(super) const MAX_RATE: u32 = 1_600_000;
const MAX_DOWNSAMPLING_TAPS: usize = 129;

#[cfg(feature = "high-quality-audio")]
static RESAMPLER_WARNING_SHOWN: AtomicBool = AtomicBool::new(false);

/// Convert `input` from `src_rate` to `dst_rate`, mono.
pub(super) fn resample(input: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    // Guard rails
    if src_rate == 0 || dst_rate == 0 {
        return input.to_vec(); // avoid div-by-zero elsewhere
    }
    if input.is_empty() || src_rate == dst_rate {
        return input.to_vec();
    }

    #[cfg(feature = "high-quality-audio")]
    {
        match resample_with_rubato(input, src_rate, dst_rate) {
            Ok(output) => output,
            Err(err) => {
                if !RESAMPLER_WARNING_SHOWN.swap(true, Ordering::AcqRel) {
                    log_debug(&format!(
                        "high-quality resampler failed ({err}); falling back to basic path"
                    ));
                }
                basic_resample(input, src_rate, dst_rate)
            }
        }
    }

    #[cfg(not(feature = "high-quality-audio"))]
    {
        basic_resample(input, src_rate, dst_rate)
    }
}

#[cfg(feature = "high-quality-audio")]
fn resample_with_rubato(input: &[f32], src_rate: u32, dst_rate: u32) -> Result<Vec<f32>> {
    if !(MIN_RATE..=MAX_RATE).contains(&src_rate) || !(MIN_RATE..=MAX_RATE).contains(&dst_rate) {
        return Err(anyhow!(
            "unsupported sample rates {src_rate}Hz -> {dst_rate}Hz for resampling"
        ));
    }
    let ratio = dst_rate as f64 / src_rate as f64;

    let chunk = 256usize;
    let params = InterpolationParameters {
        sinc_len: 64,
        f_cutoff: 0.90, // safer cutoff
        interpolation: InterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    //           ratio,  drift, params, chunk_size, channels
    let mut rs = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk, 1)
        .map_err(|e| anyhow!("failed to construct sinc resampler: {e:?}"))?;

    let mut expect = ((input.len() as f64) * ratio).round() as usize;
    expect = expect.max(1).saturating_add(8);
    let mut out = Vec::with_capacity(expect);

    let mut idx = 0usize;
    let mut seg = vec![0.0f32; chunk]; // reuse buffer
    while idx < input.len() {
        let end = (idx + chunk).min(input.len());
        if end == idx {
            return Err(anyhow!("resampler made no progress"));
        }
        let len = end - idx;
        let pad = input.get(end.wrapping_sub(1)).copied().unwrap_or(0.0);
        seg.fill(pad);
        seg[..len].copy_from_slice(&input[idx..end]);
        let produced = rs
            .process(std::slice::from_ref(&seg), None)
            .map_err(|e| anyhow!("resampler process failed: {e:?}"))?;
        out.extend_from_slice(&produced[0]);
        idx = end;
    }

    let target_len = ((input.len() as f64) * ratio).round().max(1.0) as usize;
    match out.len().cmp(&target_len) {
        CmpOrdering::Greater => out.truncate(target_len),
        CmpOrdering::Less => {
            let pad = *out.last().unwrap_or(&0.0);
            out.resize(target_len, pad);
        }
        CmpOrdering::Equal => {}
    }
    Ok(out)
}

pub(super) fn basic_resample(input: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    // Guard rails
    if src_rate == 0 || dst_rate == 0 || input.is_empty() {
        return input.to_vec();
    }
    if !(MIN_RATE..=MAX_RATE).contains(&src_rate) || !(MIN_RATE..=MAX_RATE).contains(&dst_rate) {
        return input.to_vec();
    }

    // Ratio > 1 means upsampling, < 1 means downsampling.
    let ratio = dst_rate as f32 / src_rate as f32;
    let filtered = if src_rate > dst_rate {
        // When decimating we run a small FIR low-pass to avoid aliasing.
        let taps = downsampling_tap_count(src_rate, dst_rate);
        low_pass_fir(input, src_rate, dst_rate, taps)
    } else {
        input.to_vec()
    };
    resample_linear(&filtered, ratio)
}

/// Lightweight linear resampler used after optional filtering; good enough
/// for speech where phase accuracy matters less than latency.
pub(super) fn resample_linear(input: &[f32], ratio: f32) -> Vec<f32> {
    let input_len = input.len();
    let output_len = (input_len as f32 * ratio).round() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_idx = i as f32 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = src_idx - idx as f32;

        if idx + 1 < input_len {
            let sample = input[idx] * (1.0 - frac) + input[idx + 1] * frac;
            output.push(sample);
        } else {
            let pad = input.last().copied().unwrap_or(0.0);
            output.push(pad);
        }
    }

    output
}

/// Pick a tap count from the decimation ratio so the FIR stays short for
/// near-equal rates and grows when collapsing 48 kHz into 16 kHz.
pub(super) fn downsampling_tap_count(src_rate: u32, dst_rate: u32) -> usize {
    let decimation_ratio = src_rate as f32 / dst_rate as f32;
    let mut taps = (decimation_ratio * 4.0).ceil().max(11.0) as usize;
    if taps % 2 == 0 {
        taps += 1;
    }
    taps.min(MAX_DOWNSAMPLING_TAPS)
}

/// Basic FIR low-pass that tames frequencies above the destination Nyquist
/// before samples are dropped.
pub(super) fn low_pass_fir(input: &[f32], src_rate: u32, dst_rate: u32, taps: usize) -> Vec<f32> {
    if input.is_empty() || taps <= 1 {
        return input.to_vec();
    }

    let normalized_cutoff = (dst_rate as f32 * 0.5 / src_rate as f32).min(0.499);
    let coeffs = design_low_pass(normalized_cutoff, taps);
    let half = taps / 2;
    let mut output = Vec::with_capacity(input.len());

    for n in 0..input.len() {
        let mut acc = 0.0;
        for (k, coeff) in coeffs.iter().enumerate() {
            if let Some(idx) = n.checked_add(k).and_then(|sum| sum.checked_sub(half)) {
                if let Some(sample) = input.get(idx) {
                    acc += *sample * coeff;
                }
            }
        }
        output.push(acc);
    }

    output
}

/// Pad or truncate a frame to an exact sample count.
pub(super) fn adjust_frame_length(mut data: Vec<f32>, desired: usize) -> Vec<f32> {
    match data.len().cmp(&desired) {
        CmpOrdering::Greater => {
            data.truncate(desired);
        }
        CmpOrdering::Less => {
            let pad = *data.last().unwrap_or(&0.0);
            data.resize(desired, pad);
        }
        CmpOrdering::Equal => {}
    }
    data
}

/// Build the normalized Hamming-windowed sinc taps used by the FIR filter.
pub(super) fn design_low_pass(normalized_cutoff: f32, taps: usize) -> Vec<f32> {
    let mut coeffs = Vec::with_capacity(taps);
    let m = (taps - 1) as f32;

    for n in 0..taps {
        let centered = n as f32 - m / 2.0;
        let x = 2.0 * PI * normalized_cutoff * centered;
        let sinc = if centered == 0.0 {
            2.0 * normalized_cutoff
        } else {
            (2.0 * normalized_cutoff * x.sin()) / x
        };
        let window = if taps <= 1 {
            1.0
        } else {
            0.54 - 0.46 * ((2.0 * PI * n as f32) / m).cos()
        };
        coeffs.push(sinc * window);
    }

    let sum: f32 = coeffs.iter().sum();
    if sum != 0.0 {
        for coeff in coeffs.iter_mut() {
            *coeff /= sum;
        }
    }

    coeffs
}
