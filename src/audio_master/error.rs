//! Typed errors for the mastering pipeline

/// Fatal pipeline errors. Any stage failure aborts the whole run; the
/// orchestrator performs no retries or partial recovery.
#[derive(Debug, thiserror::Error)]
pub enum MasterError {
    /// Configuration rejected before any stage touched the buffer.
    #[error("Invalid config: {message}")]
    InvalidConfig { message: String },
    /// Filter or reverb coefficients left the stable range for the buffer's
    /// sample rate (e.g. a corner frequency at or above Nyquist).
    #[error("Numeric instability in {stage}: {message}")]
    NumericInstability {
        stage: &'static str,
        message: String,
    },
}
