//! Data models and structures
//!
//! Defines the generation request collected from the user, the text-only
//! storyboard structure returned by the first remote call, the final
//! storyboard with media attached, and runtime configuration.

use crate::ai::mime::detect_image_mime;
use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Number of scenes every storyboard structure must contain.
pub const SCENE_COUNT: usize = 4;

/// Number of clips every scene must contain.
pub const CLIPS_PER_SCENE: usize = 3;

/// Visual themes offered to the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    Cinematic,
    Anime,
    Watercolor,
    ComicBook,
    PixelArt,
    Claymation,
    #[serde(rename = "3d-render")]
    #[value(name = "3d-render")]
    Render3d,
    FantasyArt,
}

impl Style {
    /// Description of the theme as it is embedded in prompts.
    pub fn description(self) -> &'static str {
        match self {
            Style::Cinematic => "cinematic film still, dramatic lighting, shallow depth of field",
            Style::Anime => "Japanese anime illustration, clean line art, vibrant cel shading",
            Style::Watercolor => "soft watercolor painting, visible paper texture, gentle washes",
            Style::ComicBook => "comic book art, bold ink outlines, halftone shading",
            Style::PixelArt => "retro 16-bit pixel art, limited palette, crisp pixels",
            Style::Claymation => "claymation stop-motion look, handmade clay figures",
            Style::Render3d => "polished 3D animated film render, soft global illumination",
            Style::FantasyArt => "epic fantasy illustration, painterly detail, rich colors",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Style::Cinematic => "cinematic",
            Style::Anime => "anime",
            Style::Watercolor => "watercolor",
            Style::ComicBook => "comic-book",
            Style::PixelArt => "pixel-art",
            Style::Claymation => "claymation",
            Style::Render3d => "3d-render",
            Style::FantasyArt => "fantasy-art",
        };
        f.write_str(name)
    }
}

/// Output frame shape for every generated image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    #[value(name = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    #[value(name = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Ratio string understood by the image API (`16:9` / `9:16`).
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A character reference image supplied by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterImage {
    pub data: Vec<u8>,
    pub base64: String,
    pub mime_type: String,
}

impl CharacterImage {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let mime_type = detect_image_mime(&data).to_string();
        let base64 = base64::engine::general_purpose::STANDARD.encode(&data);
        Self {
            data,
            base64,
            mime_type,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        if data.is_empty() {
            return Err(Error::Invariant(format!(
                "Character image is empty: {}",
                path.display()
            )));
        }
        Ok(Self::from_bytes(data))
    }
}

/// Everything the user submits for one storyboard.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub title: String,
    pub description: String,
    pub style: Style,
    pub aspect_ratio: AspectRatio,
    pub character_one: Option<CharacterImage>,
    pub character_two: Option<CharacterImage>,
}

impl GenerationRequest {
    /// Supplied character references, character one first.
    pub fn characters(&self) -> Vec<&CharacterImage> {
        self.character_one
            .iter()
            .chain(self.character_two.iter())
            .collect()
    }
}

/// Clip descriptor produced by structure generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClipOutline {
    pub id: u32,
    pub narration: String,
    pub prompt: String,
}

impl ClipOutline {
    /// Attach generated media, producing the final clip record.
    pub fn with_media(self, image: String, audio: String) -> Clip {
        Clip {
            id: self.id,
            narration: self.narration,
            prompt: self.prompt,
            image,
            audio,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneOutline {
    pub scene: u32,
    pub clips: Vec<ClipOutline>,
}

/// Text-only skeleton of a storyboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct StoryboardStructure {
    pub scenes: Vec<SceneOutline>,
}

impl StoryboardStructure {
    pub fn clip_count(&self) -> usize {
        self.scenes.iter().map(|s| s.clips.len()).sum()
    }

    /// Checks the fixed 4x3 shape, sequential 1-based numbering of scenes and
    /// clips, and that every clip carries text.
    ///
    /// Scene and clip numbers name exported files and identify failed clips,
    /// so they must be unique and match their position.
    pub fn validate(&self) -> Result<()> {
        if self.scenes.len() != SCENE_COUNT {
            return Err(Error::StructureDecode(format!(
                "expected {} scenes, got {}",
                SCENE_COUNT,
                self.scenes.len()
            )));
        }

        for (scene_index, scene) in self.scenes.iter().enumerate() {
            let expected_scene = scene_index as u32 + 1;
            if scene.scene != expected_scene {
                return Err(Error::StructureDecode(format!(
                    "scene at position {} is numbered {}",
                    expected_scene, scene.scene
                )));
            }
            if scene.clips.len() != CLIPS_PER_SCENE {
                return Err(Error::StructureDecode(format!(
                    "scene {} has {} clips, expected {}",
                    scene.scene,
                    scene.clips.len(),
                    CLIPS_PER_SCENE
                )));
            }
            for (clip_index, clip) in scene.clips.iter().enumerate() {
                let expected_clip = clip_index as u32 + 1;
                if clip.id != expected_clip {
                    return Err(Error::StructureDecode(format!(
                        "scene {}: clip at position {} is numbered {}",
                        scene.scene, expected_clip, clip.id
                    )));
                }
                if clip.narration.trim().is_empty() || clip.prompt.trim().is_empty() {
                    return Err(Error::StructureDecode(format!(
                        "scene {}, clip {} is missing narration or prompt",
                        scene.scene, clip.id
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Final clip: narration and prompt plus generated media.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub id: u32,
    pub narration: String,
    pub prompt: String,
    /// `data:image/png;base64,...` reference.
    pub image: String,
    /// Base64 raw PCM (s16le, mono, 24 kHz).
    pub audio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scene {
    pub scene: u32,
    pub clips: Vec<Clip>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Storyboard {
    pub title: String,
    pub scenes: Vec<Scene>,
}

impl Storyboard {
    pub fn clip_count(&self) -> usize {
        self.scenes.iter().map(|s| s.clips.len()).sum()
    }
}

/// Inline media returned by a generation service, still base64 encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPayload {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Audio => f.write_str("audio"),
        }
    }
}

// Configuration
const DEFAULT_STRUCTURE_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
const DEFAULT_SPEECH_VOICE: &str = "Kore";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub structure_model: String,
    pub image_model: String,
    pub speech_model: String,
    pub speech_voice: String,
    pub output_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            gemini_api_key: non_empty("GEMINI_API_KEY")
                .ok_or_else(|| Error::MissingConfig("GEMINI_API_KEY not set".to_string()))?,
            structure_model: non_empty("STRUCTURE_MODEL")
                .unwrap_or_else(|| DEFAULT_STRUCTURE_MODEL.to_string()),
            image_model: non_empty("IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            speech_model: non_empty("SPEECH_MODEL")
                .unwrap_or_else(|| DEFAULT_SPEECH_MODEL.to_string()),
            speech_voice: non_empty("SPEECH_VOICE")
                .unwrap_or_else(|| DEFAULT_SPEECH_VOICE.to_string()),
            output_dir: non_empty("OUTPUT_DIR").unwrap_or_else(|| "output".to_string()),
        })
    }
}
