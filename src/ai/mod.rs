//! AI service integration for storyboard structure, image, and speech generation
//!
//! Each capability sits behind its own trait so the pipeline can be driven
//! by the Gemini REST clients in production and by mocks in tests.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::{GeminiImageClient, GeminiSpeechClient, GeminiStructureClient};
pub use mock::{MockImageClient, MockSpeechClient, MockStructureClient};

use crate::models::{
    AspectRatio, CharacterImage, GenerationRequest, MediaPayload, StoryboardStructure,
};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait StructureService: Send + Sync {
    /// Produce the text-only storyboard skeleton for a request.
    async fn generate_structure(&self, request: &GenerationRequest)
        -> Result<StoryboardStructure>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Returns `Ok(None)` when the provider answered without an image payload.
    async fn generate_image(
        &self,
        prompt: &str,
        characters: &[&CharacterImage],
        aspect_ratio: AspectRatio,
    ) -> Result<Option<MediaPayload>>;
}

#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Returns `Ok(None)` when the provider answered without an audio payload.
    async fn synthesize(&self, narration: &str) -> Result<Option<MediaPayload>>;
}
