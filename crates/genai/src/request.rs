//! Request model for content generation
//!
//! `GenerateRequest` is the caller-facing shape. It is serialized into the
//! service's wire format (camelCase fields, `systemInstruction`,
//! `generationConfig`) by [`GenerateRequest::to_wire`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::schema::Schema;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Binary payload sent inline, base64 encoded and tagged with a MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Rejected inline payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid inline data: {0}")]
pub struct InlineDataError(String);

impl InlineData {
    /// Wrap an already base64-encoded payload, validating the encoding.
    pub fn new(
        mime_type: impl Into<String>,
        data: impl Into<String>,
    ) -> std::result::Result<Self, InlineDataError> {
        let mime_type = mime_type.into();
        let data = data.into();
        if mime_type.trim().is_empty() {
            return Err(InlineDataError("missing MIME type".into()));
        }
        if data.is_empty() {
            return Err(InlineDataError("empty payload".into()));
        }
        STANDARD
            .decode(data.as_bytes())
            .map_err(|e| InlineDataError(format!("payload is not valid base64: {e}")))?;
        Ok(Self { mime_type, data })
    }

    /// Parse a `data:<mime>;base64,<payload>` URL as produced by browser
    /// file readers and canvas captures.
    pub fn from_data_url(url: &str) -> std::result::Result<Self, InlineDataError> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| InlineDataError("expected a data: URL".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| InlineDataError("data URL has no payload".into()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| InlineDataError("data URL is not base64 encoded".into()))?;
        Self::new(mime_type, payload)
    }
}

/// One piece of a conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(InlineData),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }
}

/// A conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }
}

/// Tool declarations the service may use while generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Web-search grounding. Responses then carry citation sources.
    GoogleSearch,
}

#[derive(Serialize)]
struct EmptyConfig {}

impl Serialize for Tool {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Tool::GoogleSearch => map.serialize_entry("googleSearch", &EmptyConfig {})?,
        }
        map.end()
    }
}

/// A content-generation request, minus the model identifier which the
/// client puts in the URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Option<String>,
    pub tools: Vec<Tool>,
    pub response_schema: Option<Schema>,
    pub temperature: Option<f32>,
}

impl GenerateRequest {
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            ..Self::default()
        }
    }

    /// Single user turn made of `parts`.
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self::new(vec![Content::user(parts)])
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Constrain the response to JSON matching `schema`.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Whether the response should be parsed as JSON.
    pub fn is_structured(&self) -> bool {
        self.response_schema.is_some()
    }

    /// Serialize to the service's JSON body.
    pub fn to_wire(&self) -> Result<serde_json::Value> {
        if let Some(t) = self.temperature.filter(|t| !t.is_finite()) {
            return Err(Error::Encode(format!("temperature {t} is not finite")));
        }

        let generation_config = if self.response_schema.is_some() || self.temperature.is_some() {
            Some(WireGenerationConfig {
                response_mime_type: self.response_schema.as_ref().map(|_| "application/json"),
                response_schema: self.response_schema.as_ref(),
                temperature: self.temperature,
            })
        } else {
            None
        };

        let wire = WireRequest {
            contents: &self.contents,
            system_instruction: self.system_instruction.as_deref().map(|text| WireSystem {
                parts: [WireText { text }],
            }),
            tools: &self.tools,
            generation_config,
        };
        serde_json::to_value(wire).map_err(|e| Error::Encode(e.to_string()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireSystem<'a>>,
    #[serde(skip_serializing_if = "<[Tool]>::is_empty")]
    tools: &'a [Tool],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig<'a>>,
}

#[derive(Serialize)]
struct WireSystem<'a> {
    parts: [WireText<'a>; 1],
}

#[derive(Serialize)]
struct WireText<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}
