use crate::{Error, Result};
use base64::Engine as _;

/// Sample rate of synthesized narration.
pub const SAMPLE_RATE: u32 = 24_000;

/// Narration is always mono.
pub const CHANNELS: u16 = 1;

/// Normalized waveform ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmBuffer {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }
}

/// Convert s16le bytes to floats in `[-1.0, 1.0)`, each `sample / 32768`.
pub fn decode_pcm16(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 2 != 0 {
        return Err(Error::Audio(format!(
            "PCM payload has odd length {}",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect())
}

/// Decode a base64 narration payload into a 24 kHz mono buffer.
pub fn decode_base64_pcm(audio_base64: &str) -> Result<PcmBuffer> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(audio_base64.trim())?;
    Ok(PcmBuffer {
        samples: decode_pcm16(&bytes)?,
        sample_rate: SAMPLE_RATE,
        channels: CHANNELS,
    })
}
