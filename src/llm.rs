use std::fmt;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::prompt::CONNECTION_TEST_PROMPT;

pub const EMPTY_RESPONSE: &str = "No response generated. Please try again with a different request.";

const CANDIDATE_COUNT: u32 = 1;
const MAX_OUTPUT_TOKENS: u32 = 8192;
const TEMPERATURE: f32 = 0.2;

/// Result of one generation call. Failures are values, not errors, so the
/// caller can surface them to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Text(String),
    EmptyResponse,
    Failed(String),
}

impl Generation {
    pub fn kind(&self) -> &'static str {
        match self {
            Generation::Text(_) => "text",
            Generation::EmptyResponse => "empty_response",
            Generation::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generation::Text(text) => f.write_str(text),
            Generation::EmptyResponse => f.write_str(EMPTY_RESPONSE),
            Generation::Failed(message) => write!(f, "Error occurred while parsing: {}", message),
        }
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    candidate_count: u32,
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Default)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn first_candidate_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.gemini_api_key, &config.gemini_api_base, &config.gemini_model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Sends `prompt` once with the fixed extraction settings.
    pub async fn generate(&self, prompt: &str) -> Generation {
        info!(model = %self.model, prompt_chars = prompt.len(), "Sending request to Gemini");

        let settings = GenerationConfig {
            candidate_count: CANDIDATE_COUNT,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        };

        match self.request(prompt, Some(settings)).await {
            Ok(text) if !text.trim().is_empty() => {
                info!("Successfully parsed content with Gemini");
                Generation::Text(text.trim().to_string())
            }
            Ok(_) => {
                warn!("Gemini returned no text");
                Generation::EmptyResponse
            }
            Err(err) => {
                let message = err.message().to_string();
                warn!(error = %message, "Error parsing with Gemini");
                Generation::Failed(message)
            }
        }
    }

    /// Plain call with service-default settings to verify key and model.
    pub async fn test_connection(&self) -> std::result::Result<String, String> {
        match self.request(CONNECTION_TEST_PROMPT, None).await {
            Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(_) => Err("Connection test failed".to_string()),
            Err(err) => Err(format!("Connection test failed: {}", err.message())),
        }
    }

    async fn request(&self, prompt: &str, settings: Option<GenerationConfig>) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: settings,
        };

        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LlmError(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::LlmError(format!("Gemini returned {}: {}", status, text)));
        }

        let parsed: GenerateResponse = res
            .json()
            .await
            .map_err(|e| AppError::LlmError(format!("Invalid response format from LLM: {}", e)))?;

        Ok(parsed.first_candidate_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcomes_render_the_user_facing_strings() {
        assert_eq!(Generation::Text("done".into()).to_string(), "done");
        assert_eq!(
            Generation::EmptyResponse.to_string(),
            "No response generated. Please try again with a different request."
        );
        assert_eq!(
            Generation::Failed("quota exceeded".into()).to_string(),
            "Error occurred while parsing: quota exceeded"
        );
    }

    #[test]
    fn request_body_uses_gemini_field_names() {
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: "hi" }] }],
            generation_config: Some(GenerationConfig {
                candidate_count: CANDIDATE_COUNT,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: TEMPERATURE,
            }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["generationConfig"]["candidateCount"], 1);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 8192);
        let temperature = value["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.2).abs() < 1e-6);
    }

    #[test]
    fn connection_test_body_omits_settings() {
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: CONNECTION_TEST_PROMPT }] }],
            generation_config: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "Hello, "}, {"text": "world"}], "role": "model"}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(parsed.first_candidate_text(), "Hello, world");
    }

    #[test]
    fn blocked_response_has_no_text() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}],
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert_eq!(parsed.first_candidate_text(), "");

        let parsed: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parsed.first_candidate_text(), "");
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new("key", "http://localhost:9/", "gemini-2.0-flash-exp");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }
}
