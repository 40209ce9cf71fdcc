use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prompt::OutputFormat;
use crate::session::{ContentFormat, Extraction, DEFAULT_SESSION_ID};
use crate::workflow::ParseSource;

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

#[derive(Deserialize)]
pub struct ScrapeRequest {
    #[serde(default = "default_session_id")]
    pub session_id: String,
    pub url: String,
    #[serde(default)]
    pub format: ContentFormat,
}

#[derive(Deserialize)]
pub struct ParseRequest {
    #[serde(default = "default_session_id")]
    pub session_id: String,
    pub description: String,
    /// Free-form tag; anything unrecognized is treated as `text`.
    #[serde(default)]
    pub output_format: String,
    #[serde(default)]
    pub source: ParseSource,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Serialize)]
pub struct ParseResponse {
    pub url: Option<String>,
    pub description: String,
    pub output_format: OutputFormat,
    pub outcome: &'static str,
    pub result: String,
    pub json: Option<Value>,
}

impl From<Extraction> for ParseResponse {
    fn from(extraction: Extraction) -> Self {
        ParseResponse {
            outcome: extraction.generation.kind(),
            result: extraction.result_text(),
            url: extraction.url,
            description: extraction.description,
            output_format: extraction.output_format,
            json: extraction.parsed_json,
        }
    }
}

#[derive(Serialize)]
pub struct SessionClosed {
    pub session_id: String,
}

#[derive(Serialize)]
pub struct ConnectionCheck {
    pub model: String,
    pub reply: String,
}
