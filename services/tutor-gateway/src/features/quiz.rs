//! Quiz question generation
//!
//! One multiple-choice question per call. Clients pass the questions they
//! already asked so the model avoids repeats.

use genai::{GenerateRequest, Part, Schema};
use serde::{Deserialize, Serialize};

use super::{Difficulty, Generator, require_text};
use crate::error::{Error, Result};

/// Options per generated question.
pub const OPTION_COUNT: usize = 4;

/// Most previous questions forwarded for de-duplication.
pub const MAX_PREVIOUS: usize = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct QuizInput {
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub previous: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
}

impl QuizQuestion {
    /// Reject answers that do not form a usable question.
    fn validate(self) -> std::result::Result<Self, genai::Error> {
        if self.options.len() != OPTION_COUNT {
            return Err(genai::Error::Decode(format!(
                "expected {OPTION_COUNT} options, got {}",
                self.options.len()
            )));
        }
        if self.correct_index >= self.options.len() {
            return Err(genai::Error::Decode(format!(
                "correctIndex {} out of range",
                self.correct_index
            )));
        }
        Ok(self)
    }
}

pub fn schema() -> Schema {
    Schema::object([
        ("question", Schema::string()),
        (
            "options",
            Schema::array(Schema::string()).describe("Exactly four answer choices"),
        ),
        (
            "correctIndex",
            Schema::integer().describe("0-based index of the correct option"),
        ),
        ("explanation", Schema::string()),
    ])
}

pub fn build_request(input: &QuizInput) -> Result<GenerateRequest> {
    let topic = require_text("topic", &input.topic)?;

    let mut prompt = format!(
        "Write one {} multiple-choice question about \"{topic}\" with exactly {OPTION_COUNT} options.",
        input.difficulty.label()
    );
    let skip = input.previous.len().saturating_sub(MAX_PREVIOUS);
    let previous: Vec<&str> = input.previous[skip..]
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .collect();
    if !previous.is_empty() {
        prompt.push_str("\nDo not repeat any of these questions:");
        for q in previous {
            prompt.push_str("\n- ");
            prompt.push_str(q);
        }
    }

    Ok(GenerateRequest::from_parts(vec![Part::text(prompt)])
        .with_schema(schema())
        .with_temperature(1.0))
}

pub async fn run(generator: &Generator, input: &QuizInput) -> Result<QuizQuestion> {
    let request = build_request(input)?;
    let question: QuizQuestion = generator.json(&request).await?;
    question.validate().map_err(Error::from)
}
