//! Algorithmic reverb: parallel combs feeding series all-passes
//!
//! The classic Freeverb network reduced to one channel: eight feedback comb
//! filters with one-pole low-pass damping in the feedback path run in
//! parallel, and their sum is diffused through four series all-pass stages.
//! The wet tail is blended with the dry signal at a fixed ratio.

use super::buffer::SampleBuffer;

/// Comb delay lengths in samples at the 44.1 kHz reference rate. Mutually
/// indivisible lengths avoid resonant coloration of the tail.
const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
/// All-pass delay lengths at the reference rate.
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];
const REFERENCE_RATE: f32 = 44100.0;

/// Input attenuation into the comb bank.
const FIXED_GAIN: f32 = 0.015;
const ALLPASS_FEEDBACK: f32 = 0.5;
/// Comb feedback never reaches this bound, keeping every delay loop stable.
const MAX_FEEDBACK: f32 = 0.98;

/// Reverb tuning. `width` shapes stereo spread only; the mono pipeline
/// carries it for interface parity with stereo backends and ignores it.
#[derive(Debug, Clone)]
pub struct ReverbParams {
    pub room_size: f32,
    pub damping: f32,
    pub wet_level: f32,
    pub dry_level: f32,
    pub width: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            room_size: 0.3,
            damping: 0.5,
            wet_level: 0.15,
            dry_level: 0.85,
            width: 0.5,
        }
    }
}

struct Comb {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damp: f32,
    filter_store: f32,
}

impl Comb {
    fn new(len: usize, feedback: f32, damp: f32) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
            feedback,
            damp,
            filter_store: 0.0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.index];
        self.filter_store = output * (1.0 - self.damp) + self.filter_store * self.damp;
        self.buffer[self.index] = input + self.filter_store * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }
}

struct Allpass {
    buffer: Vec<f32>,
    index: usize,
}

impl Allpass {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        self.buffer[self.index] = input + buffered * ALLPASS_FEEDBACK;
        self.index = (self.index + 1) % self.buffer.len();
        buffered - input
    }
}

/// Mono Freeverb-style reverberator.
pub struct ReverbEngine {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
}

impl ReverbEngine {
    pub fn new(sample_rate: u32, params: &ReverbParams) -> Self {
        let scale = sample_rate as f32 / REFERENCE_RATE;
        let feedback = (0.7 + 0.28 * params.room_size).min(MAX_FEEDBACK);
        let damp = 0.4 * params.damping;

        let combs = COMB_TUNINGS
            .iter()
            .map(|&len| Comb::new((len as f32 * scale) as usize, feedback, damp))
            .collect();
        let allpasses = ALLPASS_TUNINGS
            .iter()
            .map(|&len| Allpass::new((len as f32 * scale) as usize))
            .collect();

        Self { combs, allpasses }
    }

    /// One sample of the diffuse wet signal.
    fn wet_sample(&mut self, input: f32) -> f32 {
        let attenuated = input * FIXED_GAIN;
        let mut wet = 0.0;
        for comb in &mut self.combs {
            wet += comb.process(attenuated);
        }
        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }
        wet
    }
}

/// Blend a diffuse reverberated copy into the signal.
///
/// A true pass-through when disabled: the output equals the input.
pub fn apply(input: &SampleBuffer, enabled: bool) -> SampleBuffer {
    if !enabled {
        return input.clone();
    }

    let params = ReverbParams::default();
    let mut engine = ReverbEngine::new(input.sample_rate(), &params);

    let samples = input
        .samples()
        .iter()
        .map(|&s| params.dry_level * s + params.wet_level * engine.wet_sample(s))
        .collect();

    SampleBuffer::new(samples, input.sample_rate())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse(len: usize) -> SampleBuffer {
        let mut samples = vec![0.0; len];
        samples[0] = 1.0;
        SampleBuffer::new(samples, 44100)
    }

    #[test]
    fn test_disabled_is_exact_passthrough() {
        let samples: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.13).sin() * 0.5).collect();
        let input = SampleBuffer::new(samples, 44100);
        let output = apply(&input, false);
        assert_eq!(output.samples(), input.samples());
        assert_eq!(output.sample_rate(), input.sample_rate());
    }

    #[test]
    fn test_enabled_produces_tail() {
        // An impulse must ring past the comb delays when the reverb is on.
        let input = impulse(44100);
        let output = apply(&input, true);
        assert_eq!(output.len(), input.len());

        let tail_energy: f32 = output.samples()[2000..].iter().map(|s| s * s).sum();
        assert!(tail_energy > 0.0, "no reverb tail generated");
    }

    #[test]
    fn test_tail_decays() {
        // Feedback below 1.0 means the tail dies out instead of ringing up.
        let input = impulse(44100 * 2);
        let output = apply(&input, true);

        let early: f32 = output.samples()[..22050].iter().map(|s| s * s).sum();
        let late: f32 = output.samples()[44100..].iter().map(|s| s * s).sum();
        assert!(late < early, "reverb tail is not decaying");
        assert!(output.samples().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_delay_lengths_scale_with_sample_rate() {
        let params = ReverbParams::default();
        let engine_44 = ReverbEngine::new(44100, &params);
        let engine_22 = ReverbEngine::new(22050, &params);
        assert_eq!(engine_44.combs[0].buffer.len(), COMB_TUNINGS[0]);
        assert_eq!(engine_22.combs[0].buffer.len(), COMB_TUNINGS[0] / 2);
    }
}
