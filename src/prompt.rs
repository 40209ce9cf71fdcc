use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chunker::Chunk;

pub const CONNECTION_TEST_PROMPT: &str = "Say 'Hello, Gemini is working!'";

const PREAMBLE: &str = "You are an expert content parser and data extractor. Your task is to analyze the provided web content and extract specific information based on the user's request.";
const CLOSING: &str = "Please provide your analysis and extracted information below:";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
    List,
}

impl OutputFormat {
    /// Unrecognized tags resolve to `Text`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "markdown" => OutputFormat::Markdown,
            "list" => OutputFormat::List,
            _ => OutputFormat::Text,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
            OutputFormat::List => "list",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            OutputFormat::Text => "Format your response as clear, readable text with proper paragraphs.",
            OutputFormat::Json => "Format your response as valid JSON with appropriate keys and values.",
            OutputFormat::Markdown => "Format your response using proper Markdown syntax with headers, lists, and emphasis.",
            OutputFormat::List => "Format your response as a clean, numbered or bulleted list.",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub description: String,
    pub output_format: OutputFormat,
    /// Sample outputs; when present they replace the format instructions.
    pub examples: Vec<String>,
}

impl ExtractionRequest {
    pub fn new(description: impl Into<String>, output_format: OutputFormat) -> Self {
        Self {
            description: description.into(),
            output_format,
            examples: Vec::new(),
        }
    }

    pub fn with_examples(mut self, examples: Vec<String>) -> Self {
        self.examples = examples;
        self
    }

    pub fn build_prompt(&self, chunks: &[Chunk]) -> String {
        if self.examples.is_empty() {
            build_extraction_prompt(chunks, &self.description, self.output_format)
        } else {
            build_examples_prompt(chunks, &self.description, &self.examples)
        }
    }
}

pub fn join_chunks(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(Chunk::to_string)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Content and description are interpolated verbatim.
pub fn build_extraction_prompt(chunks: &[Chunk], description: &str, format: OutputFormat) -> String {
    let content = join_chunks(chunks);
    let instruction = format.instruction();

    let mut prompt = String::with_capacity(content.len() + description.len() + 1200);
    prompt.push_str(&format!("\n{}\n\n", PREAMBLE));
    prompt.push_str(&format!("USER REQUEST: {}\n\n", description));
    prompt.push_str(&format!("OUTPUT FORMAT: {}\n", format.tag().to_uppercase()));
    prompt.push_str(&format!("FORMAT INSTRUCTIONS: {}\n\n", instruction));
    prompt.push_str(&format!("WEB CONTENT TO ANALYZE:\n{}\n\n", content));
    prompt.push_str("INSTRUCTIONS:\n");
    prompt.push_str("1. Carefully analyze the provided web content\n");
    prompt.push_str("2. Extract the information requested by the user\n");
    prompt.push_str(&format!("3. {}\n", instruction));
    prompt.push_str("4. If the requested information is not found, clearly state that in the specified format\n");
    prompt.push_str("5. Be precise and accurate in your extraction\n");
    prompt.push_str("6. Provide context when necessary to make the extracted information meaningful\n");
    prompt.push_str("7. Ensure your response follows the requested output format exactly\n\n");
    prompt.push_str(CLOSING);
    prompt.push('\n');
    prompt
}

pub fn build_examples_prompt(chunks: &[Chunk], description: &str, examples: &[String]) -> String {
    let mut example_text = String::new();
    if !examples.is_empty() {
        example_text.push_str("\n\nEXAMPLES OF DESIRED OUTPUT:\n");
        for (i, example) in examples.iter().enumerate() {
            example_text.push_str(&format!("Example {}: {}\n", i + 1, example));
        }
    }

    format!(
        r#"
{PREAMBLE}

USER REQUEST: {description}
{example_text}

WEB CONTENT TO ANALYZE:
{content}

INSTRUCTIONS:
1. Carefully analyze the provided web content
2. Extract the information requested by the user
3. Follow the pattern shown in the examples (if provided)
4. Present the results in a clear, organized format similar to the examples
5. If the requested information is not found, clearly state that
6. Be precise and accurate in your extraction
7. Maintain consistency with the example format and style

{CLOSING}
"#,
        content = join_chunks(chunks),
    )
}
