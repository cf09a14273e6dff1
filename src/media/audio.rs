//! Raw PCM to WAV packaging for synthesized speech.

use crate::error::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Sample rate of Gemini TTS output.
pub const PCM_SAMPLE_RATE: u32 = 24_000;
/// Channel count of Gemini TTS output.
pub const PCM_CHANNELS: u16 = 1;

/// Wraps 16-bit little-endian PCM in a WAV container.
///
/// A trailing byte that does not complete a sample is dropped.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let samples = pcm.chunks_exact(2);
    if !samples.remainder().is_empty() {
        tracing::warn!(len = pcm.len(), "dropping trailing partial PCM sample");
    }

    let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm.len()));
    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for sample in samples {
        writer.write_sample(i16::from_le_bytes([sample[0], sample[1]]))?;
    }
    writer.finalize()?;
    Ok(cursor.into_inner())
}
