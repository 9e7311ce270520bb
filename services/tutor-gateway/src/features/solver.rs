//! Solver chat: step-by-step worked answers in a conversation.

use genai::{GenerateRequest, InlineData, Part};
use serde::{Deserialize, Serialize};

use super::{ChatTurn, Generator, chat_contents};
use crate::error::Result;

const INSTRUCTION: &str = "You are a math and science problem solver. Solve the student's \
problem step by step, numbering each step and writing every expression in LaTeX. End with a \
clearly marked final answer.";

#[derive(Debug, Clone, Deserialize)]
pub struct SolverInput {
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    pub message: String,
    /// Optional data URL of a photographed problem.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolverReply {
    pub reply: String,
}

pub fn build_request(input: &SolverInput) -> Result<GenerateRequest> {
    let attachments = match input.image.as_deref().map(str::trim) {
        None | Some("") => Vec::new(),
        Some(url) => vec![Part::InlineData(InlineData::from_data_url(url)?)],
    };
    let contents = chat_contents(&input.history, &input.message, attachments)?;

    Ok(GenerateRequest::new(contents)
        .with_system_instruction(INSTRUCTION)
        .with_temperature(0.2))
}

pub async fn run(generator: &Generator, input: &SolverInput) -> Result<SolverReply> {
    let request = build_request(input)?;
    let response = generator.text(&request).await?;
    Ok(SolverReply {
        reply: response.text,
    })
}
