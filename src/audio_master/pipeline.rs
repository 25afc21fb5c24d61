//! Pipeline orchestration: stage ordering, config, and the processing report
//!
//! The mastering chain is a fixed ordered list of stage functions with a
//! single conditional (reverb). Every stage is a pure function from one
//! buffer to a fresh buffer, so the orchestrator just threads the working
//! buffer through the list and aborts on the first failure.

use serde::{Deserialize, Serialize};

use super::buffer::SampleBuffer;
use super::error::MasterError;
use super::{dynamics, normalize, reverb, spectral, tone};

/// Tuning for one pipeline run. Immutable once processing starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterConfig {
    /// Noise reduction intensity: 0.0 leaves the signal untouched, 1.0
    /// pushes noise-floor bins down to the mask floor.
    pub noise_reduction_strength: f32,
    /// Whether to blend in the reverb tail.
    pub apply_reverb: bool,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            noise_reduction_strength: 0.7,
            apply_reverb: true,
        }
    }
}

impl MasterConfig {
    pub fn validate(&self) -> Result<(), MasterError> {
        if !(0.0..=1.0).contains(&self.noise_reduction_strength) {
            return Err(MasterError::InvalidConfig {
                message: format!(
                    "noise reduction strength must be within 0.0..=1.0, got {}",
                    self.noise_reduction_strength
                ),
            });
        }
        Ok(())
    }
}

/// Which stages ran during a pipeline pass. All flags are true on success
/// except reverb, which mirrors the config toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectsApplied {
    pub noise_reduction: bool,
    pub compression: bool,
    pub eq: bool,
    pub noise_gate: bool,
    pub reverb: bool,
    pub normalization: bool,
}

/// Metadata describing one completed pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterReport {
    /// Input duration in seconds.
    pub duration: f64,
    pub sample_rate: u32,
    pub effects_applied: EffectsApplied,
}

type Stage = Box<dyn Fn(&SampleBuffer) -> Result<SampleBuffer, MasterError>>;

/// Run the full mastering chain over a buffer.
///
/// Stage order is fixed: noise reduction, compressor, noise gate, tone
/// filter, reverb (optional), normalization. Any stage failure aborts the
/// run; no stage is retried or skipped other than reverb.
pub fn process(
    input: &SampleBuffer,
    config: &MasterConfig,
) -> Result<(SampleBuffer, MasterReport), MasterError> {
    config.validate()?;

    let duration = input.duration_secs();
    let sample_rate = input.sample_rate();
    log::info!(
        "mastering {:.2}s of audio at {} Hz (noise reduction {:.0}%, reverb {})",
        duration,
        sample_rate,
        config.noise_reduction_strength * 100.0,
        if config.apply_reverb { "on" } else { "off" }
    );

    let strength = config.noise_reduction_strength;
    let apply_reverb = config.apply_reverb;
    let stages: [(&str, Stage); 6] = [
        (
            "noise_reduction",
            Box::new(move |buf| Ok(spectral::reduce(buf, strength))),
        ),
        ("compressor", Box::new(|buf| Ok(dynamics::compress(buf)))),
        ("noise_gate", Box::new(|buf| Ok(dynamics::gate(buf)))),
        ("tone_filter", Box::new(tone::process)),
        (
            "reverb",
            Box::new(move |buf| Ok(reverb::apply(buf, apply_reverb))),
        ),
        ("normalize", Box::new(|buf| Ok(normalize::normalize(buf)))),
    ];

    let mut working = input.clone();
    for (name, stage) in &stages {
        log::info!("stage: {}", name);
        working = stage(&working)?;
    }

    let report = MasterReport {
        duration,
        sample_rate,
        effects_applied: EffectsApplied {
            noise_reduction: true,
            compression: true,
            eq: true,
            noise_gate: true,
            reverb: config.apply_reverb,
            normalization: true,
        },
    };

    Ok((working, report))
}
