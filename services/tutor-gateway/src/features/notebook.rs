//! Notebook analysis
//!
//! Reviews photographed notebook pages: what was covered, where the student
//! went wrong, and what to do next. Mistakes reference the 1-based page
//! number in upload order.

use genai::{GenerateRequest, Part, Schema};
use serde::{Deserialize, Serialize};

use super::{Generator, inline_parts, optional_text};
use crate::error::Result;

pub const MAX_PAGES: usize = 20;

const INSTRUCTION: &str = "You review student notebooks. Summarize the material covered, list \
the topics, point out every mistake with its page number and a correction, and suggest what to \
practice next. Use LaTeX for math.";

#[derive(Debug, Clone, Deserialize)]
pub struct NotebookInput {
    /// Data URLs of the notebook pages, in order.
    pub pages: Vec<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookAnalysis {
    pub summary: String,
    pub topics: Vec<String>,
    pub mistakes: Vec<Mistake>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mistake {
    pub page: u32,
    pub description: String,
    pub correction: String,
}

pub fn schema() -> Schema {
    Schema::object([
        ("summary", Schema::string()),
        ("topics", Schema::array(Schema::string())),
        (
            "mistakes",
            Schema::array(Schema::object([
                ("page", Schema::integer().describe("1-based page number")),
                ("description", Schema::string()),
                ("correction", Schema::string()),
            ])),
        ),
        ("suggestions", Schema::array(Schema::string())),
    ])
}

pub fn build_request(input: &NotebookInput) -> Result<GenerateRequest> {
    let pages = inline_parts("pages", &input.pages, 1, MAX_PAGES)?;

    let mut prompt = format!("Review these {} notebook page(s).", pages.len());
    if let Some(subject) = optional_text("subject", input.subject.as_deref())? {
        prompt.push_str(&format!(" The subject is {subject}."));
    }

    let mut parts = vec![Part::text(prompt)];
    parts.extend(pages);

    Ok(GenerateRequest::from_parts(parts)
        .with_system_instruction(INSTRUCTION)
        .with_schema(schema()))
}

pub async fn run(generator: &Generator, input: &NotebookInput) -> Result<NotebookAnalysis> {
    let request = build_request(input)?;
    generator.json(&request).await
}
