use super::client::GeminiHttpClient;
use super::types::{first_text, Content, GenerateContentResponse, Part};
use crate::ai::StructureService;
use crate::models::{GenerationRequest, StoryboardStructure, CLIPS_PER_SCENE, SCENE_COUNT};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct StructureRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: StructureGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StructureGenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

/// Response schema: exactly four scenes of exactly three clips.
fn storyboard_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "minItems": SCENE_COUNT,
        "maxItems": SCENE_COUNT,
        "items": {
            "type": "OBJECT",
            "properties": {
                "scene": { "type": "INTEGER" },
                "clips": {
                    "type": "ARRAY",
                    "minItems": CLIPS_PER_SCENE,
                    "maxItems": CLIPS_PER_SCENE,
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "id": { "type": "INTEGER" },
                            "narration": { "type": "STRING" },
                            "prompt": { "type": "STRING" }
                        },
                        "required": ["id", "narration", "prompt"],
                        "propertyOrdering": ["id", "narration", "prompt"]
                    }
                }
            },
            "required": ["scene", "clips"],
            "propertyOrdering": ["scene", "clips"]
        }
    })
}

pub fn structure_prompt(request: &GenerationRequest) -> String {
    prompts::render(
        prompts::STRUCTURE,
        &[
            ("title", &request.title),
            ("description", &request.description),
            ("style", request.style.description()),
            ("orientation", prompts::orientation(request.aspect_ratio)),
        ],
    )
}

pub struct GeminiStructureClient {
    http: GeminiHttpClient,
}

impl GeminiStructureClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(60),
                client,
            ),
        }
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiStructureClient);

#[async_trait]
impl StructureService for GeminiStructureClient {
    async fn generate_structure(
        &self,
        request: &GenerationRequest,
    ) -> Result<StoryboardStructure> {
        let body = StructureRequest {
            contents: vec![Content::user(vec![Part::Text {
                text: structure_prompt(request),
            }])],
            generation_config: StructureGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: storyboard_schema(),
            },
        };

        tracing::debug!("Requesting storyboard structure from {}", self.http.model());
        let response: GenerateContentResponse = self.http.generate_content(&body).await?;

        let text = first_text(&response).ok_or_else(|| {
            Error::StructureDecode("No text in Gemini structure response".to_string())
        })?;

        let structure: StoryboardStructure = serde_json::from_str(text.trim())
            .map_err(|e| Error::StructureDecode(format!("{}: {}", e, text)))?;
        structure.validate()?;

        Ok(structure)
    }
}
