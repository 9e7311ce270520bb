//! Worksheet generation

use genai::{GenerateRequest, Part, Schema};
use serde::{Deserialize, Serialize};

use super::{Difficulty, Generator, optional_text, require_text};
use crate::error::{Error, Result};

pub const MAX_PROBLEMS: u32 = 30;

fn default_count() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetInput {
    pub topic: String,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_count")]
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    pub title: String,
    pub instructions: String,
    pub problems: Vec<WorksheetProblem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetProblem {
    pub question: String,
    pub answer: String,
}

pub fn schema() -> Schema {
    Schema::object([
        ("title", Schema::string()),
        ("instructions", Schema::string()),
        (
            "problems",
            Schema::array(Schema::object([
                ("question", Schema::string()),
                ("answer", Schema::string()),
            ])),
        ),
    ])
}

pub fn build_request(input: &WorksheetInput) -> Result<GenerateRequest> {
    let topic = require_text("topic", &input.topic)?;
    if input.count == 0 || input.count > MAX_PROBLEMS {
        return Err(Error::InvalidInput(format!(
            "count must be between 1 and {MAX_PROBLEMS}"
        )));
    }

    let mut prompt = format!(
        "Create a printable worksheet on \"{topic}\" with exactly {} {} problems.",
        input.count,
        input.difficulty.label()
    );
    if let Some(grade) = optional_text("gradeLevel", input.grade_level.as_deref())? {
        prompt.push_str(&format!(" Pitch it at {grade} level."));
    }
    prompt.push_str(" Give a short answer for every problem. Use LaTeX for math.");

    Ok(GenerateRequest::from_parts(vec![Part::text(prompt)])
        .with_schema(schema())
        .with_temperature(0.8))
}

pub async fn run(generator: &Generator, input: &WorksheetInput) -> Result<Worksheet> {
    let request = build_request(input)?;
    generator.json(&request).await
}
