//! Tutoring chat
//!
//! Conversational tutor with optional web-search grounding. Attachments may
//! be images of work or short voice recordings. Grounded replies carry the
//! cited sources.

use genai::{Citation, GenerateRequest, Tool};
use serde::{Deserialize, Serialize};

use super::{ChatTurn, Generator, chat_contents, inline_parts};
use crate::error::Result;

/// Most attachments accepted with one message.
pub const MAX_ATTACHMENTS: usize = 4;

const INSTRUCTION: &str = "You are a friendly, patient tutor for school students. Guide the \
student towards the answer with questions and hints instead of giving it away immediately. \
Keep explanations short and check understanding. Use LaTeX for math.";

fn default_grounded() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TutorInput {
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    pub message: String,
    /// Data URLs of images or audio clips sent with the message.
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default = "default_grounded")]
    pub grounded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TutorReply {
    pub reply: String,
    pub sources: Vec<Citation>,
}

pub fn build_request(input: &TutorInput) -> Result<GenerateRequest> {
    let attachments = inline_parts("attachments", &input.attachments, 0, MAX_ATTACHMENTS)?;
    let contents = chat_contents(&input.history, &input.message, attachments)?;

    let request = GenerateRequest::new(contents).with_system_instruction(INSTRUCTION);
    Ok(if input.grounded {
        request.with_tool(Tool::GoogleSearch)
    } else {
        request
    })
}

pub async fn run(generator: &Generator, input: &TutorInput) -> Result<TutorReply> {
    let request = build_request(input)?;
    let response = generator.text(&request).await?;
    Ok(TutorReply {
        reply: response.text,
        sources: response.citations,
    })
}
