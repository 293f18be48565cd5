use super::client::GeminiHttpClient;
use super::types::{finish_reason, first_inline_data, Content, GenerateContentResponse, Part};
use crate::ai::SpeechService;
use crate::models::MediaPayload;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SpeechRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: SpeechGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechGenerationConfig {
    response_modalities: Vec<String>,
    speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

/// Text-to-speech over Gemini; returns raw 24 kHz mono s16le PCM.
pub struct GeminiSpeechClient {
    http: GeminiHttpClient,
    voice: String,
}

impl GeminiSpeechClient {
    pub fn new(api_key: String, model: String, voice: String) -> Self {
        Self::new_with_client(api_key, model, voice, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        voice: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(60),
                client,
            ),
            voice,
        }
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiSpeechClient);

#[async_trait]
impl SpeechService for GeminiSpeechClient {
    async fn synthesize(&self, narration: &str) -> Result<Option<MediaPayload>> {
        let request = SpeechRequest {
            contents: vec![Content::user(vec![Part::Text {
                text: narration.to_string(),
            }])],
            generation_config: SpeechGenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.voice.clone(),
                        },
                    },
                },
            },
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        let payload = first_inline_data(&response).map(|audio| MediaPayload {
            mime_type: audio.mime_type.clone(),
            data: audio.data.clone(),
        });
        if payload.is_none() {
            tracing::warn!(
                "No audio data in Gemini response (finish reason: {})",
                finish_reason(&response).unwrap_or("unknown")
            );
        }
        Ok(payload)
    }
}
