//! Peak normalization to just under full scale

use super::buffer::SampleBuffer;

/// Target peak level, leaving headroom against clipping during later format
/// conversion.
const TARGET_PEAK: f32 = 0.97;

/// Scale the buffer so its absolute peak lands on the target level.
///
/// Silence comes back unchanged; that is a successful (no-op) run, not an
/// error. No output sample ever exceeds unity magnitude.
pub fn normalize(input: &SampleBuffer) -> SampleBuffer {
    let peak = input.peak();
    if peak <= 0.0 {
        log::info!("silent buffer, normalization skipped");
        return input.clone();
    }

    let gain = TARGET_PEAK / peak;
    let samples = input.samples().iter().map(|&s| s * gain).collect();
    SampleBuffer::new(samples, input.sample_rate())
}
