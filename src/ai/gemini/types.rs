//! Shared Gemini payload types and response extraction helpers.

use serde::{Deserialize, Serialize};

/// Gemini content container used in both requests and responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }
}

/// Untagged union of text and inline media content parts.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Base64 inline payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Top-level `generateContent` response envelope.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Candidate completion item. Blocked candidates arrive without content.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// First inline binary part of the first candidate.
///
/// Only the first candidate is inspected. Returns `None` when the response
/// has no candidates, the first candidate carries no content (for example
/// because it was blocked), or none of its parts is inline data. Callers
/// treat `None` as "payload absent" rather than as a transport failure.
pub fn first_inline_data(response: &GenerateContentResponse) -> Option<&InlineData> {
    let candidate = response.candidates.first()?;
    let content = candidate.content.as_ref()?;
    content.parts.iter().find_map(|p| match p {
        Part::InlineData { inline_data } => Some(inline_data),
        Part::Text { .. } => None,
    })
}

/// Concatenated text parts of the first candidate, if any.
pub fn first_text(response: &GenerateContentResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|p| match p {
            Part::Text { text } => Some(text.as_str()),
            Part::InlineData { .. } => None,
        })
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Finish reason of the first candidate, used for diagnostics.
pub fn finish_reason(response: &GenerateContentResponse) -> Option<&str> {
    response.candidates.first()?.finish_reason.as_deref()
}
