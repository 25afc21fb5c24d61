//! Audio file decode/encode glue around the mastering core
//!
//! Decodes any supported container/codec (WAV, M4A, MP3, AAC, FLAC) into a
//! mono [`SampleBuffer`], averaging channels where needed, and writes results
//! back out as 32-bit float WAV.

use std::fs::File;
use std::path::Path;

use hound::{WavSpec, WavWriter};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio_master::SampleBuffer;

/// File decode/encode failures.
#[derive(Debug, thiserror::Error)]
pub enum AudioIoError {
    #[error("Failed to open file: {0}")]
    Open(#[from] std::io::Error),
    #[error("Failed to probe format: {0}")]
    Probe(SymphoniaError),
    #[error("No audio tracks found")]
    NoAudioTrack,
    #[error("Failed to create decoder: {0}")]
    Decoder(SymphoniaError),
    #[error("Error reading packet: {0}")]
    Format(SymphoniaError),
    #[error("No audio samples decoded")]
    EmptyStream,
    #[error("WAV write error: {0}")]
    Encode(#[from] hound::Error),
}

/// Decode an audio file into a mono buffer, averaging channels if needed.
pub fn decode_audio(path: &Path) -> Result<SampleBuffer, AudioIoError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(AudioIoError::Probe)?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioIoError::NoAudioTrack)?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(2)
        .max(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(AudioIoError::Decoder)?;

    let mut mono_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(AudioIoError::Format(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(AudioIoError::Format(e)),
        };

        let spec = *decoded.spec();
        let duration = decoded.capacity() as u64;

        let mut sample_buf = symphonia::core::audio::SampleBuffer::<f32>::new(duration, spec);
        sample_buf.copy_interleaved_ref(decoded);

        // Mix to mono by channel averaging
        for chunk in sample_buf.samples().chunks(channels) {
            let mono = chunk.iter().sum::<f32>() / channels as f32;
            mono_samples.push(mono);
        }
    }

    if mono_samples.is_empty() {
        return Err(AudioIoError::EmptyStream);
    }
    if channels > 1 {
        log::info!("downmixed {} channels to mono", channels);
    }

    Ok(SampleBuffer::new(mono_samples, sample_rate))
}

/// Write a mono buffer as 32-bit float WAV.
pub fn write_wav(path: &Path, buffer: &SampleBuffer) -> Result<(), AudioIoError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in buffer.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    log::info!("wrote {} samples to {}", buffer.len(), path.display());
    Ok(())
}
