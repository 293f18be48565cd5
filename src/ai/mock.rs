use super::{ImageGenerationService, SpeechService, StructureService};
use crate::models::{
    AspectRatio, CharacterImage, ClipOutline, GenerationRequest, MediaPayload, SceneOutline,
    StoryboardStructure,
};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// A 1x1 PNG used as the default mock image.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Four little-endian i16 samples: 0, 16384, -16384, -32768.
pub const TINY_PCM: &[u8] = &[0x00, 0x00, 0x00, 0x40, 0x00, 0xC0, 0x00, 0x80];

/// Structure with `scenes` x `clips` numbered clips, text derived from position.
pub fn sample_structure(scenes: u32, clips: u32) -> StoryboardStructure {
    StoryboardStructure {
        scenes: (1..=scenes)
            .map(|scene| SceneOutline {
                scene,
                clips: (1..=clips)
                    .map(|id| ClipOutline {
                        id,
                        narration: format!("Narration for scene {} clip {}", scene, id),
                        prompt: format!("Picture for scene {} clip {}", scene, id),
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[derive(Clone)]
pub struct MockStructureClient {
    structure: Arc<Mutex<StoryboardStructure>>,
    failure: Arc<Mutex<Option<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockStructureClient {
    pub fn new() -> Self {
        Self {
            structure: Arc::new(Mutex::new(sample_structure(4, 3))),
            failure: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Return `structure` as-is, without shape validation.
    pub fn with_structure(self, structure: StoryboardStructure) -> Self {
        *self.structure.lock().unwrap() = structure;
        self
    }

    pub fn with_decode_failure(self, message: String) -> Self {
        *self.failure.lock().unwrap() = Some(message);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockStructureClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StructureService for MockStructureClient {
    async fn generate_structure(
        &self,
        _request: &GenerationRequest,
    ) -> Result<StoryboardStructure> {
        *self.call_count.lock().unwrap() += 1;

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::StructureDecode(message));
        }
        Ok(self.structure.lock().unwrap().clone())
    }
}

/// One image generation call as seen by [`MockImageClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCall {
    pub prompt: String,
    pub character_count: usize,
    pub aspect_ratio: AspectRatio,
}

#[derive(Clone)]
pub struct MockImageClient {
    responses: Arc<Mutex<Vec<MediaPayload>>>,
    missing_on_calls: Arc<Mutex<HashSet<usize>>>,
    calls: Arc<Mutex<Vec<ImageCall>>>,
}

impl MockImageClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            missing_on_calls: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_image_response(self, response: MediaPayload) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Answer the `call`-th request (1-based) without an image payload.
    pub fn with_missing_payload_on_call(self, call: usize) -> Self {
        self.missing_on_calls.lock().unwrap().insert(call);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<ImageCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockImageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageClient {
    async fn generate_image(
        &self,
        prompt: &str,
        characters: &[&CharacterImage],
        aspect_ratio: AspectRatio,
    ) -> Result<Option<MediaPayload>> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(ImageCall {
                prompt: prompt.to_string(),
                character_count: characters.len(),
                aspect_ratio,
            });
            calls.len()
        };

        if self.missing_on_calls.lock().unwrap().contains(&count) {
            return Ok(None);
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Some(MediaPayload {
                mime_type: "image/png".to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(TINY_PNG),
            }))
        } else {
            let index = (count - 1) % responses.len();
            Ok(Some(responses[index].clone()))
        }
    }
}

#[derive(Clone)]
pub struct MockSpeechClient {
    missing_on_calls: Arc<Mutex<HashSet<usize>>>,
    narrations: Arc<Mutex<Vec<String>>>,
}

impl MockSpeechClient {
    pub fn new() -> Self {
        Self {
            missing_on_calls: Arc::new(Mutex::new(HashSet::new())),
            narrations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer the `call`-th request (1-based) without an audio payload.
    pub fn with_missing_payload_on_call(self, call: usize) -> Self {
        self.missing_on_calls.lock().unwrap().insert(call);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.narrations.lock().unwrap().len()
    }

    pub fn narrations(&self) -> Vec<String> {
        self.narrations.lock().unwrap().clone()
    }
}

impl Default for MockSpeechClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechService for MockSpeechClient {
    async fn synthesize(&self, narration: &str) -> Result<Option<MediaPayload>> {
        let count = {
            let mut narrations = self.narrations.lock().unwrap();
            narrations.push(narration.to_string());
            narrations.len()
        };

        if self.missing_on_calls.lock().unwrap().contains(&count) {
            return Ok(None);
        }

        Ok(Some(MediaPayload {
            mime_type: "audio/L16;codec=pcm;rate=24000".to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(TINY_PCM),
        }))
    }
}
