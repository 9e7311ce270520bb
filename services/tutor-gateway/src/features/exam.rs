//! Exam paper analysis
//!
//! Takes scanned or photographed exam pages (images or PDF) and returns a
//! per-question breakdown with worked solutions.

use genai::{GenerateRequest, Part, Schema};
use serde::{Deserialize, Serialize};

use super::{Generator, inline_parts, optional_text};
use crate::error::Result;

/// Most pages accepted in one upload.
pub const MAX_FILES: usize = 10;

const INSTRUCTION: &str = "You are an experienced exam marker. Read every question on the \
provided exam pages, solve each one, and explain the solution so a student could follow it. \
Use LaTeX for mathematical notation.";

#[derive(Debug, Clone, Deserialize)]
pub struct ExamInput {
    /// Data URLs of the exam pages.
    pub files: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamAnalysis {
    pub subject: String,
    pub summary: String,
    pub questions: Vec<QuestionAnalysis>,
    pub study_tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnalysis {
    pub number: String,
    pub topic: String,
    pub question: String,
    pub solution: String,
    pub difficulty: String,
}

pub fn schema() -> Schema {
    Schema::object([
        ("subject", Schema::string()),
        ("summary", Schema::string()),
        (
            "questions",
            Schema::array(Schema::object([
                ("number", Schema::string().describe("Question label as printed")),
                ("topic", Schema::string()),
                ("question", Schema::string()),
                ("solution", Schema::string().describe("Worked solution")),
                ("difficulty", Schema::string().describe("easy, medium or hard")),
            ])),
        ),
        ("studyTips", Schema::array(Schema::string())),
    ])
}

pub fn build_request(input: &ExamInput) -> Result<GenerateRequest> {
    let files = inline_parts("files", &input.files, 1, MAX_FILES)?;

    let mut prompt = String::from("Analyze this exam paper question by question.");
    if let Some(notes) = optional_text("notes", input.notes.as_deref())? {
        prompt.push_str("\nStudent notes: ");
        prompt.push_str(notes);
    }

    let mut parts = vec![Part::text(prompt)];
    parts.extend(files);

    Ok(GenerateRequest::from_parts(parts)
        .with_system_instruction(INSTRUCTION)
        .with_schema(schema()))
}

pub async fn run(generator: &Generator, input: &ExamInput) -> Result<ExamAnalysis> {
    let request = build_request(input)?;
    generator.json(&request).await
}
