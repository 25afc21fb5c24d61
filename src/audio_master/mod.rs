//! Broadcast mastering pipeline
//!
//! Fixed processing chain turning a raw mono recording into a cleaned,
//! balanced, broadcast-ready signal:
//! 1. Spectral noise reduction (STFT gain masking)
//! 2. Compressor (envelope-follower dynamics)
//! 3. Noise gate
//! 4. Tone filtering (high-pass + low-shelf biquads, makeup gain)
//! 5. Algorithmic reverb (comb/all-pass, optional)
//! 6. Peak normalization
//!
//! Every stage is a pure function of (input buffer, parameters) to a fresh
//! output buffer; nothing is shared between invocations, so concurrent runs
//! on distinct buffers cannot interfere.

pub mod buffer;
pub mod dynamics;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod reverb;
pub mod spectral;
pub mod tone;

pub use buffer::SampleBuffer;
pub use error::MasterError;
pub use pipeline::{process, EffectsApplied, MasterConfig, MasterReport};
