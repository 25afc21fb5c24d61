//! Spectral noise reduction using STFT gain masking
//!
//! Estimates a stationary noise floor per frequency bin from the whole
//! signal, then attenuates magnitudes toward zero wherever they sit close to
//! that floor. Works for the constant background sources a recording booth
//! actually has: hiss, fan and AC rumble.

use realfft::RealFftPlanner;

use super::buffer::SampleBuffer;

/// FFT frame length in samples.
const FFT_SIZE: usize = 2048;
/// Hop between successive frames (75% overlap).
const HOP_SIZE: usize = FFT_SIZE / 4;
/// Per-bin percentile of frame magnitudes taken as the noise floor. The
/// quietest recurring energy in a bin is assumed to be noise.
const NOISE_PERCENTILE: f32 = 0.20;
/// Lower clamp for the spectral gain mask. Fully zeroed bins produce
/// audible musical-noise artifacts.
const GAIN_FLOOR: f32 = 0.05;
/// Overlap-add positions with less accumulated window energy than this keep
/// the original samples.
const MIN_WINDOW_SUM: f32 = 1e-3;

/// Reduce stationary background noise.
///
/// `strength` is expected to be within [0, 1]: 0 leaves the signal untouched
/// (up to reconstruction rounding), 1 pushes noise-floor bins down to the
/// mask floor. Output length and sample rate always match the input.
///
/// Buffers shorter than one analysis frame are passed through unchanged;
/// the bypass is logged as a degraded-but-successful run.
pub fn reduce(input: &SampleBuffer, strength: f32) -> SampleBuffer {
    let samples = input.samples();
    if samples.len() < FFT_SIZE {
        log::warn!(
            "buffer too short for spectral analysis ({} < {} samples), noise reduction bypassed",
            samples.len(),
            FFT_SIZE
        );
        return input.clone();
    }

    let mut planner = RealFftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(FFT_SIZE);
    let inverse = planner.plan_fft_inverse(FFT_SIZE);

    let window = hann_window(FFT_SIZE);
    let mut frame = vec![0.0f32; FFT_SIZE];
    let mut spectrum = forward.make_output_vec();

    // Pass 1: magnitude spectrum of every frame, for the noise profile and
    // the gain masks.
    let mut magnitudes: Vec<Vec<f32>> = Vec::new();
    let mut pos = 0;
    while pos + FFT_SIZE <= samples.len() {
        for (dst, (s, w)) in frame
            .iter_mut()
            .zip(samples[pos..pos + FFT_SIZE].iter().zip(&window))
        {
            *dst = s * w;
        }
        if forward.process(&mut frame, &mut spectrum).is_err() {
            // Cannot happen with matching plan/buffer lengths.
            log::warn!("forward FFT failed, noise reduction bypassed");
            return input.clone();
        }
        magnitudes.push(spectrum.iter().map(|c| c.norm()).collect());
        pos += HOP_SIZE;
    }

    let noise_floor = noise_profile(&magnitudes);
    let masks = smooth_over_time(&smooth_over_bins(&gain_masks(
        &magnitudes,
        &noise_floor,
        strength,
    )));

    // Pass 2: re-transform each frame, apply its smoothed mask to the
    // magnitudes (phase untouched), and overlap-add the inverse transforms.
    let norm = 1.0 / FFT_SIZE as f32;
    let bins = spectrum.len();
    let mut output = vec![0.0f32; samples.len()];
    let mut window_sum = vec![0.0f32; samples.len()];
    let mut time_frame = inverse.make_output_vec();

    for (frame_idx, mask) in masks.iter().enumerate() {
        let pos = frame_idx * HOP_SIZE;
        for (dst, (s, w)) in frame
            .iter_mut()
            .zip(samples[pos..pos + FFT_SIZE].iter().zip(&window))
        {
            *dst = s * w;
        }
        if forward.process(&mut frame, &mut spectrum).is_err() {
            continue;
        }

        for (c, &gain) in spectrum.iter_mut().zip(mask) {
            *c = *c * gain;
        }
        // The inverse real transform requires purely real DC and Nyquist bins.
        spectrum[0].im = 0.0;
        spectrum[bins - 1].im = 0.0;

        if inverse.process(&mut spectrum, &mut time_frame).is_err() {
            continue;
        }
        for i in 0..FFT_SIZE {
            output[pos + i] += time_frame[i] * norm * window[i];
            window_sum[pos + i] += window[i] * window[i];
        }
    }

    // Normalize by accumulated window energy; tail samples no frame covered
    // keep their input values.
    let mut result = samples.to_vec();
    for (i, sample) in result.iter_mut().enumerate() {
        if window_sum[i] > MIN_WINDOW_SUM {
            *sample = output[i] / window_sum[i];
        }
    }

    SampleBuffer::new(result, input.sample_rate())
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos()))
        .collect()
}

/// Per-bin noise floor: a low percentile of that bin's magnitude across all
/// frames. Assumes the noise is present for the whole recording.
fn noise_profile(magnitudes: &[Vec<f32>]) -> Vec<f32> {
    let frames = magnitudes.len();
    let bins = magnitudes.first().map_or(0, Vec::len);
    let idx = ((frames.saturating_sub(1)) as f32 * NOISE_PERCENTILE).round() as usize;

    let mut column = vec![0.0f32; frames];
    (0..bins)
        .map(|bin| {
            for (slot, mags) in column.iter_mut().zip(magnitudes) {
                *slot = mags[bin];
            }
            column.sort_by(|a, b| a.total_cmp(b));
            column[idx]
        })
        .collect()
}

/// Raw per-frame gain masks: attenuate a bin by how close its magnitude sits
/// to the noise floor, scaled by strength, never below the mask floor.
fn gain_masks(magnitudes: &[Vec<f32>], noise_floor: &[f32], strength: f32) -> Vec<Vec<f32>> {
    magnitudes
        .iter()
        .map(|mags| {
            mags.iter()
                .zip(noise_floor)
                .map(|(&mag, &floor)| {
                    let ratio = (floor / mag.max(1e-10)).min(1.0);
                    (1.0 - strength * ratio).clamp(GAIN_FLOOR, 1.0)
                })
                .collect()
        })
        .collect()
}

/// 3-tap moving average across frequency, per frame.
fn smooth_over_bins(masks: &[Vec<f32>]) -> Vec<Vec<f32>> {
    masks
        .iter()
        .map(|row| {
            let n = row.len();
            (0..n)
                .map(|i| {
                    let lo = i.saturating_sub(1);
                    let hi = (i + 1).min(n - 1);
                    row[lo..=hi].iter().sum::<f32>() / (hi - lo + 1) as f32
                })
                .collect()
        })
        .collect()
}

/// 3-tap moving average across adjacent frames, per bin.
fn smooth_over_time(masks: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let frames = masks.len();
    (0..frames)
        .map(|f| {
            let lo = f.saturating_sub(1);
            let hi = (f + 1).min(frames - 1);
            let count = (hi - lo + 1) as f32;
            let bins = masks[f].len();
            (0..bins)
                .map(|bin| masks[lo..=hi].iter().map(|row| row[bin]).sum::<f32>() / count)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random generator for test signals.
    struct Lcg(u64);

    impl Lcg {
        fn next_f32(&mut self) -> f32 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((self.0 >> 40) as f32) / (1u64 << 24) as f32
        }
    }

    fn noise_buffer(len: usize, amplitude: f32, seed: u64) -> SampleBuffer {
        let mut lcg = Lcg(seed);
        let samples = (0..len)
            .map(|_| amplitude * (2.0 * lcg.next_f32() - 1.0))
            .collect();
        SampleBuffer::new(samples, 44100)
    }

    fn energy(buffer: &SampleBuffer) -> f64 {
        buffer.samples().iter().map(|&s| (s as f64) * (s as f64)).sum()
    }

    #[test]
    fn test_short_buffer_bypassed() {
        let input = noise_buffer(FFT_SIZE - 1, 0.1, 7);
        let output = reduce(&input, 0.8);
        assert_eq!(output.samples(), input.samples());
        assert_eq!(output.sample_rate(), input.sample_rate());
    }

    #[test]
    fn test_length_and_rate_preserved() {
        let input = noise_buffer(FFT_SIZE * 4 + 123, 0.1, 7);
        for strength in [0.0, 0.5, 1.0] {
            let output = reduce(&input, strength);
            assert_eq!(output.len(), input.len());
            assert_eq!(output.sample_rate(), input.sample_rate());
        }
    }

    #[test]
    fn test_zero_strength_is_transparent() {
        let input = noise_buffer(FFT_SIZE * 4, 0.3, 21);
        let output = reduce(&input, 0.0);
        let max_diff = input
            .samples()
            .iter()
            .zip(output.samples())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_diff < 1e-4, "max deviation {} at zero strength", max_diff);
    }

    #[test]
    fn test_reduction_monotone_in_strength() {
        // A noise-only buffer: every bin sits at the noise floor, so total
        // energy must not increase as strength increases.
        let input = noise_buffer(FFT_SIZE * 8, 0.05, 99);
        let energies: Vec<f64> = [0.0, 0.3, 0.7, 1.0]
            .iter()
            .map(|&strength| energy(&reduce(&input, strength)))
            .collect();
        for pair in energies.windows(2) {
            assert!(
                pair[1] <= pair[0] * 1.01,
                "energy increased with strength: {:?}",
                energies
            );
        }
        // Full strength must actually remove something.
        assert!(energies[3] < energies[0] * 0.5);
    }

    #[test]
    fn test_burst_tone_survives_reduction() {
        // Quiet noise in the first half, a loud tone burst in the second.
        // The percentile floor learns the noise level from the quiet half,
        // so the burst's bins sit far above it and keep near-unity gain.
        let sample_rate = 44100u32;
        let len = FFT_SIZE * 8;
        let mut lcg = Lcg(3);
        let samples: Vec<f32> = (0..len)
            .map(|i| {
                let hiss = 0.01 * (2.0 * lcg.next_f32() - 1.0);
                if i < len / 2 {
                    hiss
                } else {
                    let t = i as f32 / sample_rate as f32;
                    hiss + 0.5 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
                }
            })
            .collect();
        let input = SampleBuffer::new(samples, sample_rate);
        let output = reduce(&input, 1.0);

        let half = len / 2;
        let burst_in: f64 = input.samples()[half..].iter().map(|&s| (s as f64).powi(2)).sum();
        let burst_out: f64 = output.samples()[half..].iter().map(|&s| (s as f64).powi(2)).sum();
        let quiet_in: f64 = input.samples()[..half].iter().map(|&s| (s as f64).powi(2)).sum();
        let quiet_out: f64 = output.samples()[..half].iter().map(|&s| (s as f64).powi(2)).sum();

        assert!(burst_out > burst_in * 0.5, "tone burst was crushed");
        assert!(quiet_out < quiet_in, "noise-only region was not reduced");
    }
}
