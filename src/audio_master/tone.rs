//! Tonal correction: high-pass, low-shelf EQ, and makeup gain
//!
//! Two cascaded biquad stages followed by a fixed scalar gain. Coefficient
//! construction validates corner frequencies against Nyquist, so an
//! unsupported sample rate fails before any sample is touched.

use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Type, Q_BUTTERWORTH_F32};

use super::buffer::SampleBuffer;
use super::error::MasterError;

/// High-pass cutoff removing handling rumble and sub-bass noise.
const HIGHPASS_HZ: f32 = 80.0;
/// Low-shelf corner; frequencies below it get the body boost.
const SHELF_HZ: f32 = 400.0;
const SHELF_GAIN_DB: f32 = 3.0;
const SHELF_Q: f32 = 0.707;
/// Fixed output makeup gain.
const MAKEUP_GAIN_DB: f32 = 2.0;

const STAGE: &str = "tone_filter";

/// The fixed three-stage tone chain: 80 Hz high-pass, 400 Hz low shelf
/// (+3 dB), +2 dB makeup gain.
#[derive(Debug)]
pub struct ToneFilterBank {
    highpass: DirectForm1<f32>,
    low_shelf: DirectForm1<f32>,
    makeup: f32,
}

impl ToneFilterBank {
    pub fn new(sample_rate: f32) -> Result<Self, MasterError> {
        let highpass = Coefficients::<f32>::from_params(
            Type::HighPass,
            sample_rate.hz(),
            HIGHPASS_HZ.hz(),
            Q_BUTTERWORTH_F32,
        )
        .map_err(|e| MasterError::NumericInstability {
            stage: STAGE,
            message: format!(
                "high-pass coefficients at {} Hz for {} Hz sample rate: {:?}",
                HIGHPASS_HZ, sample_rate, e
            ),
        })?;

        let low_shelf = Coefficients::<f32>::from_params(
            Type::LowShelf(SHELF_GAIN_DB),
            sample_rate.hz(),
            SHELF_HZ.hz(),
            SHELF_Q,
        )
        .map_err(|e| MasterError::NumericInstability {
            stage: STAGE,
            message: format!(
                "low-shelf coefficients at {} Hz for {} Hz sample rate: {:?}",
                SHELF_HZ, sample_rate, e
            ),
        })?;

        Ok(Self {
            highpass: DirectForm1::<f32>::new(highpass),
            low_shelf: DirectForm1::<f32>::new(low_shelf),
            makeup: 10.0_f32.powf(MAKEUP_GAIN_DB / 20.0),
        })
    }

    pub fn process(&mut self, input: &SampleBuffer) -> SampleBuffer {
        let samples = input
            .samples()
            .iter()
            .map(|&s| self.low_shelf.run(self.highpass.run(s)) * self.makeup)
            .collect();
        SampleBuffer::new(samples, input.sample_rate())
    }
}

/// Run the tone chain over a buffer.
pub fn process(input: &SampleBuffer) -> Result<SampleBuffer, MasterError> {
    let mut bank = ToneFilterBank::new(input.sample_rate() as f32)?;
    Ok(bank.process(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_creation() {
        assert!(ToneFilterBank::new(44100.0).is_ok());
        assert!(ToneFilterBank::new(48000.0).is_ok());
    }

    #[test]
    fn test_corner_above_nyquist_rejected() {
        // 100 Hz sample rate puts both corners past Nyquist.
        let err = ToneFilterBank::new(100.0).unwrap_err();
        assert!(matches!(
            err,
            MasterError::NumericInstability { stage: "tone_filter", .. }
        ));
    }

    #[test]
    fn test_dc_removed() {
        let input = SampleBuffer::new(vec![1.0; 44100], 44100);
        let output = process(&input).unwrap();
        // After the high-pass settles, the constant offset is gone.
        let tail = &output.samples()[22050..];
        let mean: f32 = tail.iter().sum::<f32>() / tail.len() as f32;
        assert!(mean.abs() < 0.01, "residual DC mean {}", mean);
    }

    #[test]
    fn test_length_and_rate_preserved() {
        let samples = (0..4096)
            .map(|i| (i as f32 * 0.05).sin() * 0.4)
            .collect();
        let input = SampleBuffer::new(samples, 48000);
        let output = process(&input).unwrap();
        assert_eq!(output.len(), input.len());
        assert_eq!(output.sample_rate(), 48000);
    }
}
