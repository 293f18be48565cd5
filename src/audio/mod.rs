//! Narration audio: PCM decoding and single-source playback
//!
//! Speech arrives as base64 raw PCM (signed 16-bit little-endian, mono,
//! 24 kHz). [`pcm`] turns it into a float waveform, [`playback`] owns the
//! one active playback, and `speaker` (feature `speaker`) plays it through
//! the default output device.

pub mod pcm;
pub mod playback;
#[cfg(feature = "speaker")]
pub mod speaker;

pub use pcm::{decode_base64_pcm, decode_pcm16, PcmBuffer, CHANNELS, SAMPLE_RATE};
pub use playback::{Completion, PlaybackBackend, PlaybackHandle, PlaybackManager};
#[cfg(feature = "speaker")]
pub use speaker::SpeakerBackend;
