//! Response parsing for content generation

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Web source cited by a grounded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    pub title: String,
}

/// Generated text plus any grounding citations.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    pub text: String,
    pub citations: Vec<Citation>,
}

impl GenerateResponse {
    /// Parse a raw success body. A body with no text in the first candidate
    /// is an error: callers never see an empty answer.
    pub fn from_body(body: &str) -> Result<Self> {
        let wire: WireResponse = serde_json::from_str(body)
            .map_err(|e| Error::Decode(format!("malformed response body: {e}")))?;

        let Some(candidate) = wire.candidates.into_iter().next() else {
            if let Some(reason) = wire.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(Error::Decode(format!("prompt blocked: {reason}")));
            }
            return Err(Error::EmptyResponse);
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(Error::EmptyResponse);
        }

        let mut citations: Vec<Citation> = Vec::new();
        if let Some(metadata) = candidate.grounding_metadata {
            for web in metadata.grounding_chunks.into_iter().filter_map(|c| c.web) {
                let Some(uri) = web.uri else { continue };
                if citations.iter().any(|c| c.uri == uri) {
                    continue;
                }
                let title = web.title.unwrap_or_else(|| uri.clone());
                citations.push(Citation { uri, title });
            }
        }

        Ok(Self { text, citations })
    }

    /// Parse the generated text as JSON. Tolerates a markdown code fence
    /// around the payload.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(strip_code_fence(&self.text))
            .map_err(|e| Error::Decode(format!("generated text is not the expected JSON: {e}")))
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    prompt_feedback: Option<WirePromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    content: Option<WireContent>,
    grounding_metadata: Option<WireGroundingMetadata>,
}

#[derive(Deserialize)]
struct WireContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Deserialize)]
struct WirePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<WireGroundingChunk>,
}

#[derive(Deserialize)]
struct WireGroundingChunk {
    web: Option<WireWebSource>,
}

#[derive(Deserialize)]
struct WireWebSource {
    uri: Option<String>,
    title: Option<String>,
}

/// Error envelope returned with non-success statuses.
#[derive(Deserialize)]
pub(crate) struct WireErrorBody {
    pub error: WireErrorDetail,
}

#[derive(Deserialize)]
pub(crate) struct WireErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}
