//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use crate::models::MediaKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Failed to decode storyboard structure: {0}")]
    StructureDecode(String),

    #[error("No {media} returned for scene {scene}, clip {clip}")]
    ClipMedia {
        scene: u32,
        clip: u32,
        media: MediaKind,
    },

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
