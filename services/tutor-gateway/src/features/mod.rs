//! Feature call sites
//!
//! Each feature turns a client request into one `GenerateRequest`, runs it
//! through the retry executor, and parses the answer: as JSON when the
//! request carries a response schema, as plain text otherwise. Input
//! validation happens before any key is drawn from the pool.

pub mod exam;
pub mod frame;
pub mod notebook;
pub mod quiz;
pub mod solver;
pub mod tutor;
pub mod worksheet;

use genai::{Content, GenerateRequest, GenerateResponse, InlineData, Part, Role};
use key_pool::RetryExecutor;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Longest accepted free-text field, in characters.
pub const MAX_TEXT_CHARS: usize = 8_000;

/// Most prior turns forwarded from a chat history.
pub const MAX_HISTORY_TURNS: usize = 40;

/// Shared handle used by every feature: one HTTP client, one retry executor
/// over the process-wide key pool, one model.
#[derive(Clone)]
pub struct Generator {
    client: genai::Client,
    executor: RetryExecutor,
    model: String,
}

impl Generator {
    pub fn new(client: genai::Client, executor: RetryExecutor, model: impl Into<String>) -> Self {
        Self {
            client,
            executor,
            model: model.into(),
        }
    }

    pub fn executor(&self) -> &RetryExecutor {
        &self.executor
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run a free-text request with key rotation.
    pub async fn text(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let response = self
            .executor
            .execute_with_retry(|key| async move {
                self.client.generate(&self.model, key.as_ref(), request).await
            })
            .await?;
        Ok(response)
    }

    /// Run a schema-constrained request with key rotation and parse the JSON
    /// answer inside the attempt.
    pub async fn json<T: DeserializeOwned>(&self, request: &GenerateRequest) -> Result<T> {
        let parsed = self
            .executor
            .execute_with_retry(|key| async move {
                let response = self
                    .client
                    .generate(&self.model, key.as_ref(), request)
                    .await?;
                response.json::<T>()
            })
            .await?;
        Ok(parsed)
    }
}

/// Requested difficulty for generated material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// One prior turn of a chat transcript.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

/// Reject blank or oversized free text.
pub fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("{field} must not be empty")));
    }
    if value.chars().count() > MAX_TEXT_CHARS {
        return Err(Error::InvalidInput(format!(
            "{field} exceeds {MAX_TEXT_CHARS} characters"
        )));
    }
    Ok(value)
}

/// Same limits as [`require_text`], but blank means absent.
pub fn optional_text<'a>(field: &str, value: Option<&'a str>) -> Result<Option<&'a str>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => require_text(field, v).map(Some),
    }
}

/// Decode a list of data URLs, enforcing a count range.
pub fn inline_parts(field: &str, urls: &[String], min: usize, max: usize) -> Result<Vec<Part>> {
    if urls.len() < min {
        return Err(Error::InvalidInput(format!(
            "{field} needs at least {min} item(s)"
        )));
    }
    if urls.len() > max {
        return Err(Error::InvalidInput(format!(
            "{field} accepts at most {max} items"
        )));
    }
    urls.iter()
        .map(|url| {
            InlineData::from_data_url(url)
                .map(Part::InlineData)
                .map_err(|e| Error::InvalidInput(format!("{field}: {e}")))
        })
        .collect()
}

/// Build chat contents: prior turns (most recent `MAX_HISTORY_TURNS` kept)
/// followed by the new user message and its attachments.
pub fn chat_contents(history: &[ChatTurn], message: &str, attachments: Vec<Part>) -> Result<Vec<Content>> {
    let message = require_text("message", message)?;
    let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);

    let mut contents: Vec<Content> = history[skip..]
        .iter()
        .filter(|turn| !turn.text.trim().is_empty())
        .map(|turn| Content {
            role: turn.role,
            parts: vec![Part::text(turn.text.trim())],
        })
        .collect();

    let mut parts = vec![Part::text(message)];
    parts.extend(attachments);
    contents.push(Content::user(parts));
    Ok(contents)
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Smallest valid PNG-ish data URL for request-building tests.
    pub const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgo=";

    /// Audio clip data URL.
    pub const AUDIO_DATA_URL: &str = "data:audio/webm;base64,GkXfow==";
}

#[cfg(test)]
mod tests {
    use super::test_support::PNG_DATA_URL;
    use super::*;

    #[test]
    fn require_text_trims_and_rejects_blank() {
        assert_eq!(require_text("topic", "  fractions ").unwrap(), "fractions");
        let err = require_text("topic", "   ").unwrap_err();
        assert_eq!(err.to_string(), "invalid request: topic must not be empty");
    }

    #[test]
    fn require_text_rejects_oversized_input() {
        let long = "x".repeat(MAX_TEXT_CHARS + 1);
        assert!(require_text("message", &long).is_err());
    }

    #[test]
    fn optional_text_treats_blank_as_absent() {
        assert_eq!(optional_text("notes", None).unwrap(), None);
        assert_eq!(optional_text("notes", Some("  ")).unwrap(), None);
        assert_eq!(optional_text("notes", Some(" ch. 3 ")).unwrap(), Some("ch. 3"));
    }

    #[test]
    fn inline_parts_enforces_count_and_format() {
        let one = vec![PNG_DATA_URL.to_string()];
        assert_eq!(inline_parts("pages", &one, 1, 2).unwrap().len(), 1);

        assert!(inline_parts("pages", &[], 1, 2).is_err());
        let three = vec![PNG_DATA_URL.to_string(); 3];
        assert!(inline_parts("pages", &three, 1, 2).is_err());

        let bad = vec!["https://example.org/page.png".to_string()];
        let err = inline_parts("pages", &bad, 1, 2).unwrap_err();
        assert!(err.to_string().contains("pages"), "got: {err}");
    }

    #[test]
    fn chat_contents_appends_message_after_history() {
        let history = vec![
            ChatTurn {
                role: Role::User,
                text: "What is a prime?".into(),
            },
            ChatTurn {
                role: Role::Model,
                text: "A number with exactly two divisors.".into(),
            },
            ChatTurn {
                role: Role::User,
                text: "   ".into(),
            },
        ];
        let contents = chat_contents(&history, "Is 1 prime?", vec![]).unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1].role, Role::Model);
        assert_eq!(contents[2].role, Role::User);
        assert_eq!(contents[2].parts, vec![Part::text("Is 1 prime?")]);
    }

    #[test]
    fn chat_contents_keeps_only_recent_history() {
        let history: Vec<ChatTurn> = (0..MAX_HISTORY_TURNS + 10)
            .map(|i| ChatTurn {
                role: if i % 2 == 0 { Role::User } else { Role::Model },
                text: format!("turn {i}"),
            })
            .collect();
        let contents = chat_contents(&history, "next", vec![]).unwrap();
        assert_eq!(contents.len(), MAX_HISTORY_TURNS + 1);
        assert_eq!(contents[0].parts, vec![Part::text("turn 10")]);
    }

    #[test]
    fn chat_contents_rejects_blank_message() {
        assert!(chat_contents(&[], "  ", vec![]).is_err());
    }

    #[test]
    fn difficulty_defaults_to_medium() {
        assert_eq!(Difficulty::default(), Difficulty::Medium);
        let parsed: Difficulty = serde_json::from_str("\"hard\"").unwrap();
        assert_eq!(parsed.label(), "hard");
    }
}
