//! Broadcast mastering pipeline for mono guitar and voice recordings.
//!
//! The DSP core lives in [`audio_master`]; [`audio_io`] wraps it with file
//! decode/encode glue. The core's only entry point is
//! [`audio_master::process`], which takes a mono buffer plus a config and
//! returns the mastered buffer together with a processing report.

pub mod audio_io;
pub mod audio_master;
