//! Compressor and noise gate built on a shared envelope follower
//!
//! Both stages track a smoothed signal level in decibels with asymmetric
//! attack/release time constants, then turn the distance from a threshold
//! into a gain. The compressor attenuates above its threshold to even out
//! the dynamic range; the gate attenuates below its threshold to suppress
//! the residual floor between phrases. No lookahead; the only state is the
//! follower level, scoped to one pass over one buffer.

use super::buffer::SampleBuffer;

// Compressor: evens out loud and soft passages.
const COMP_THRESHOLD_DB: f32 = -16.0;
const COMP_RATIO: f32 = 4.0;
const COMP_ATTACK_MS: f32 = 5.0;
const COMP_RELEASE_MS: f32 = 100.0;

// Noise gate: fast attack preserves transients, 10:1 pushes near-silence down.
const GATE_THRESHOLD_DB: f32 = -40.0;
const GATE_RATIO: f32 = 10.0;
const GATE_ATTACK_MS: f32 = 1.0;
const GATE_RELEASE_MS: f32 = 100.0;

/// Silence floor for level detection; keeps log10 away from -inf.
const LEVEL_FLOOR_DB: f32 = -100.0;

/// Smoothed level estimate in dB with separate rise/fall time constants.
struct EnvelopeFollower {
    attack_coeff: f32,
    release_coeff: f32,
    level_db: f32,
}

impl EnvelopeFollower {
    fn new(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            attack_coeff: time_coeff(attack_ms, sample_rate),
            release_coeff: time_coeff(release_ms, sample_rate),
            level_db: LEVEL_FLOOR_DB,
        }
    }

    fn track(&mut self, input_db: f32) -> f32 {
        let coeff = if input_db > self.level_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.level_db = coeff * self.level_db + (1.0 - coeff) * input_db;
        self.level_db
    }
}

fn time_coeff(time_ms: f32, sample_rate: f32) -> f32 {
    (-1.0 / (time_ms / 1000.0 * sample_rate)).exp()
}

fn linear_to_db(value: f32) -> f32 {
    (20.0 * value.abs().log10()).max(LEVEL_FLOOR_DB)
}

fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Apply 4:1 downward compression above -16 dB.
pub fn compress(input: &SampleBuffer) -> SampleBuffer {
    let mut follower = EnvelopeFollower::new(
        input.sample_rate() as f32,
        COMP_ATTACK_MS,
        COMP_RELEASE_MS,
    );

    let samples = input
        .samples()
        .iter()
        .map(|&sample| {
            let level = follower.track(linear_to_db(sample));
            let gain = if level > COMP_THRESHOLD_DB {
                let reduction_db = (level - COMP_THRESHOLD_DB) * (1.0 - 1.0 / COMP_RATIO);
                db_to_linear(-reduction_db)
            } else {
                1.0
            };
            sample * gain
        })
        .collect();

    SampleBuffer::new(samples, input.sample_rate())
}

/// Attenuate samples whose smoothed level falls below -40 dB.
pub fn gate(input: &SampleBuffer) -> SampleBuffer {
    let mut follower = EnvelopeFollower::new(
        input.sample_rate() as f32,
        GATE_ATTACK_MS,
        GATE_RELEASE_MS,
    );

    let samples = input
        .samples()
        .iter()
        .map(|&sample| {
            let level = follower.track(linear_to_db(sample));
            let gain = if level < GATE_THRESHOLD_DB {
                let reduction_db =
                    ((GATE_THRESHOLD_DB - level) * (1.0 - 1.0 / GATE_RATIO)).max(0.0);
                db_to_linear(-reduction_db)
            } else {
                1.0
            };
            sample * gain
        })
        .collect();

    SampleBuffer::new(samples, input.sample_rate())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(amplitude: f32, len: usize) -> SampleBuffer {
        let samples = (0..len)
            .map(|i| {
                let t = i as f32 / 44100.0;
                amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect();
        SampleBuffer::new(samples, 44100)
    }

    fn energy(buffer: &SampleBuffer) -> f32 {
        buffer.samples().iter().map(|s| s * s).sum()
    }

    #[test]
    fn test_compressor_reduces_loud_signal() {
        let input = sine(0.8, 44100);
        let output = compress(&input);
        assert_eq!(output.len(), input.len());
        assert!(energy(&output) < energy(&input));
    }

    #[test]
    fn test_compressor_unity_below_threshold() {
        // Peak -26 dB stays below the -16 dB threshold; gain is exactly 1.
        let input = sine(0.05, 44100);
        let output = compress(&input);
        assert_eq!(output.samples(), input.samples());
    }

    #[test]
    fn test_gate_keeps_silence_silent() {
        let input = SampleBuffer::new(vec![0.0; 8192], 44100);
        let output = gate(&input);
        assert!(output.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_gate_passes_loud_signal() {
        let input = sine(0.5, 44100);
        let output = gate(&input);
        // Only the initial attack ramp is attenuated.
        assert!(energy(&output) > energy(&input) * 0.8);
    }

    #[test]
    fn test_gate_attenuates_quiet_signal() {
        // Peak -60 dB sits well below the gate threshold.
        let input = sine(0.001, 44100);
        let output = gate(&input);
        assert!(energy(&output) < energy(&input) * 0.1);
    }
}
