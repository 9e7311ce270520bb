//! Camera frame analysis
//!
//! A single captured frame of handwritten or printed math. Returns the
//! problem as read, the solution steps, and the final answer.

use genai::{GenerateRequest, InlineData, Part, Schema};
use serde::{Deserialize, Serialize};

use super::{Generator, optional_text};
use crate::error::Result;

const INSTRUCTION: &str = "You solve math problems from photos. Transcribe the problem exactly \
as written, then solve it step by step. Use LaTeX for all expressions. If the image holds no \
readable problem, say so in the problem field and leave the steps empty.";

#[derive(Debug, Clone, Deserialize)]
pub struct FrameInput {
    /// Data URL of the captured frame.
    pub image: String,
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSolution {
    pub problem: String,
    pub steps: Vec<SolutionStep>,
    pub final_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionStep {
    pub explanation: String,
    pub expression: String,
}

pub fn schema() -> Schema {
    Schema::object([
        ("problem", Schema::string().describe("The problem as transcribed from the image")),
        (
            "steps",
            Schema::array(Schema::object([
                ("explanation", Schema::string()),
                ("expression", Schema::string().describe("LaTeX for this step")),
            ])),
        ),
        ("finalAnswer", Schema::string()),
    ])
}

pub fn build_request(input: &FrameInput) -> Result<GenerateRequest> {
    let image = InlineData::from_data_url(&input.image)?;
    let prompt = match optional_text("question", input.question.as_deref())? {
        Some(question) => format!("Solve the problem in this image. The student asks: {question}"),
        None => "Solve the problem in this image.".to_string(),
    };

    Ok(
        GenerateRequest::from_parts(vec![Part::text(prompt), Part::InlineData(image)])
            .with_system_instruction(INSTRUCTION)
            .with_schema(schema()),
    )
}

pub async fn run(generator: &Generator, input: &FrameInput) -> Result<FrameSolution> {
    let request = build_request(input)?;
    generator.json(&request).await
}
