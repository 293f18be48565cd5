use super::client::GeminiHttpClient;
use super::types::{
    finish_reason, first_inline_data, Content, GenerateContentResponse, InlineData, Part,
};
use crate::ai::ImageGenerationService;
use crate::models::{AspectRatio, CharacterImage, MediaPayload};
use crate::{prompts, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ImageRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: ImageGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageGenerationConfig {
    response_modalities: Vec<String>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

/// Text instruction sent alongside any character reference images.
pub fn image_prompt(prompt: &str, has_characters: bool) -> String {
    let characters = if has_characters {
        prompts::CHARACTER_REFERENCE.trim()
    } else {
        ""
    };
    prompts::render(
        prompts::IMAGE,
        &[("prompt", prompt), ("characters", characters)],
    )
}

pub struct GeminiImageClient {
    http: GeminiHttpClient,
}

impl GeminiImageClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(120),
                client,
            ),
        }
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiImageClient);

#[async_trait]
impl ImageGenerationService for GeminiImageClient {
    async fn generate_image(
        &self,
        prompt: &str,
        characters: &[&CharacterImage],
        aspect_ratio: AspectRatio,
    ) -> Result<Option<MediaPayload>> {
        // References go first so the instruction can refer to "the attached images".
        let mut parts: Vec<Part> = characters
            .iter()
            .map(|c| Part::InlineData {
                inline_data: InlineData {
                    mime_type: c.mime_type.clone(),
                    data: c.base64.clone(),
                },
            })
            .collect();
        parts.push(Part::Text {
            text: image_prompt(prompt, !characters.is_empty()),
        });

        let request = ImageRequest {
            contents: vec![Content::user(parts)],
            generation_config: ImageGenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: ImageConfig {
                    aspect_ratio: aspect_ratio.as_str().to_string(),
                },
            },
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        match first_inline_data(&response) {
            Some(image_data) => {
                tracing::debug!(
                    "Gemini returned image with mime_type: {}",
                    image_data.mime_type
                );
                Ok(Some(MediaPayload {
                    mime_type: image_data.mime_type.clone(),
                    data: image_data.data.clone(),
                }))
            }
            None => {
                tracing::warn!(
                    "No image data in Gemini response (finish reason: {})",
                    finish_reason(&response).unwrap_or("unknown")
                );
                Ok(None)
            }
        }
    }
}
