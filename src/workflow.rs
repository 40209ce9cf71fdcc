use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::chunker::split_content;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::llm::GeminiClient;
use crate::normalizer::{ContentStats, ScrapedRecord};
use crate::prompt::ExtractionRequest;
use crate::scraper::ScrapeClient;
use crate::session::{ContentFormat, Extraction, Session};

pub const SCRAPE_FAILED: &str = "Failed to scrape the website. Check that the URL is accessible and try again.";

/// What to feed the model: the cleaned page text, or the whole record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseSource {
    #[default]
    Text,
    Record,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeSummary {
    pub url: String,
    pub title: Option<String>,
    pub content_format: ContentFormat,
    pub stats: ContentStats,
    pub record: Option<ScrapedRecord>,
    pub text: String,
}

pub struct Workflow {
    scraper: ScrapeClient,
    llm: GeminiClient,
    max_chunk_length: usize,
}

impl Workflow {
    pub fn new(scraper: ScrapeClient, llm: GeminiClient, max_chunk_length: usize) -> Self {
        Self {
            scraper,
            llm,
            max_chunk_length,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            ScrapeClient::from_config(config)?,
            GeminiClient::from_config(config),
            config.max_chunk_length,
        ))
    }

    pub fn llm(&self) -> &GeminiClient {
        &self.llm
    }

    /// Scrapes `url` into `session`. On failure the session is left as it was.
    pub async fn scrape(&self, session: &mut Session, url: &str, format: ContentFormat) -> Result<ScrapeSummary> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::ValidationError("Please enter a valid URL".to_string()));
        }

        let output = self
            .scraper
            .scrape_and_process(url, format.scrape_format())
            .await
            .ok_or_else(|| AppError::FetchError(SCRAPE_FAILED.to_string()))?;

        session.apply_scrape(url, output);
        let text = session.text_content().unwrap_or_default().to_string();
        let record = session.record().cloned();
        info!(url, format = format.tag(), chars = text.len(), "Stored scraped content");

        // The summary measures the page text as scraped, before cleaning.
        let stats = match &record {
            Some(record) => ContentStats::of(&record.text, Some(record)),
            None => ContentStats::of(&text, None),
        };

        Ok(ScrapeSummary {
            url: url.to_string(),
            title: record.as_ref().map(|r| r.display_title().to_string()),
            content_format: format,
            stats,
            record,
            text,
        })
    }

    /// Runs one extraction over the session content. Generation failures are
    /// stored and returned like any other result.
    pub async fn parse(
        &self,
        session: &mut Session,
        request: ExtractionRequest,
        source: ParseSource,
    ) -> Result<Extraction> {
        if request.description.trim().is_empty() {
            return Err(AppError::ValidationError("Please describe what you want to extract".to_string()));
        }

        let content = match (source, session.record()) {
            (ParseSource::Record, Some(record)) => serde_json::to_value(record)
                .map_err(|e| AppError::ParseError(format!("Failed to serialize record: {}", e)))?,
            (ParseSource::Record, None) => {
                return Err(AppError::SessionError(
                    "No structured record in this session; scrape with the json format first".to_string(),
                ));
            }
            (ParseSource::Text, _) => match session.text_content() {
                Some(text) => Value::String(text.to_string()),
                None => {
                    return Err(AppError::SessionError(
                        "No scraped content in this session; scrape a URL first".to_string(),
                    ));
                }
            },
        };

        let chunks = split_content(&content, self.max_chunk_length);
        let prompt = request.build_prompt(&chunks);
        debug!(
            chunks = chunks.len(),
            examples = request.examples.len(),
            prompt_chars = prompt.len(),
            "Built extraction prompt"
        );

        let generation = self.llm.generate(&prompt).await;
        info!(outcome = generation.kind(), format = %request.output_format, "Extraction finished");

        let extraction = Extraction::new(
            session.url().map(str::to_string),
            request.description,
            request.output_format,
            generation,
        );
        session.record_extraction(extraction.clone());
        Ok(extraction)
    }
}
