//! Writing finished storyboards to disk
//!
//! A storyboard directory holds `storyboard.json` plus one PNG and one WAV
//! per clip, named `scene{S}_clip{C}`.

use crate::audio::{decode_base64_pcm, CHANNELS, SAMPLE_RATE};
use crate::image::decode_data_url;
use crate::models::Storyboard;
use crate::{Error, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const STORYBOARD_FILE: &str = "storyboard.json";

pub fn clip_file_stem(scene: u32, clip: u32) -> String {
    format!("scene{}_clip{}", scene, clip)
}

/// Write `samples` (normalized floats) as 16-bit mono 24 kHz WAV.
pub fn write_wav(path: &Path, samples: &[f32]) -> Result<()> {
    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for sample in samples {
        let value = (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        writer.write_sample(value)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Write the storyboard JSON and every clip's media into `dir`.
///
/// Fails before touching the filesystem if two clips share a file name.
pub fn write_storyboard(storyboard: &Storyboard, dir: &Path) -> Result<PathBuf> {
    let mut stems = HashSet::new();
    for scene in &storyboard.scenes {
        for clip in &scene.clips {
            if !stems.insert(clip_file_stem(scene.scene, clip.id)) {
                return Err(Error::Invariant(format!(
                    "duplicate clip numbering: scene {}, clip {}",
                    scene.scene, clip.id
                )));
            }
        }
    }

    fs::create_dir_all(dir)?;

    for scene in &storyboard.scenes {
        for clip in &scene.clips {
            let stem = clip_file_stem(scene.scene, clip.id);

            let (_, png) = decode_data_url(&clip.image)?;
            fs::write(dir.join(format!("{}.png", stem)), png)?;

            let audio = decode_base64_pcm(&clip.audio)?;
            write_wav(&dir.join(format!("{}.wav", stem)), &audio.samples)?;
        }
    }

    let json_path = dir.join(STORYBOARD_FILE);
    fs::write(&json_path, serde_json::to_string_pretty(storyboard)?)?;
    tracing::info!("Saved storyboard at: {}", json_path.display());

    Ok(json_path)
}

/// Load a storyboard previously written by [`write_storyboard`].
pub fn read_storyboard(path: &Path) -> Result<Storyboard> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
