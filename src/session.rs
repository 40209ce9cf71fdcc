//! Per-user state carried between the scrape and parse actions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::Generation;
use crate::normalizer::{clean_text, ContentStats, ScrapedRecord};
use crate::prompt::OutputFormat;
use crate::scraper::{ScrapeFormat, ScrapeOutput};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    #[default]
    Json,
    Text,
}

impl ContentFormat {
    pub fn tag(self) -> &'static str {
        match self {
            ContentFormat::Json => "json",
            ContentFormat::Text => "text",
        }
    }

    pub fn scrape_format(self) -> ScrapeFormat {
        match self {
            ContentFormat::Json => ScrapeFormat::Json,
            ContentFormat::Text => ScrapeFormat::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub url: Option<String>,
    pub description: String,
    pub output_format: OutputFormat,
    pub generation: Generation,
    /// Decoded model output, for JSON requests whose text is valid JSON.
    pub parsed_json: Option<Value>,
}

impl Extraction {
    pub fn new(url: Option<String>, description: String, output_format: OutputFormat, generation: Generation) -> Self {
        let parsed_json = match (&generation, output_format) {
            (Generation::Text(text), OutputFormat::Json) => serde_json::from_str(text).ok(),
            _ => None,
        };

        Self {
            url,
            description,
            output_format,
            generation,
            parsed_json,
        }
    }

    pub fn result_text(&self) -> String {
        self.generation.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    pub url: String,
    pub parse_description: String,
    pub result: String,
    pub content_format: String,
    pub scraped_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    url: Option<String>,
    record: Option<ScrapedRecord>,
    text_content: Option<String>,
    content_format: Option<ContentFormat>,
    last_extraction: Option<Extraction>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn record(&self) -> Option<&ScrapedRecord> {
        self.record.as_ref()
    }

    pub fn text_content(&self) -> Option<&str> {
        self.text_content.as_deref()
    }

    pub fn content_format(&self) -> Option<ContentFormat> {
        self.content_format
    }

    pub fn last_extraction(&self) -> Option<&Extraction> {
        self.last_extraction.as_ref()
    }

    /// Replaces the current content with a fresh scrape. The previous
    /// extraction is kept; it still records the URL it was made from.
    pub fn apply_scrape(&mut self, url: &str, output: ScrapeOutput) {
        match output {
            ScrapeOutput::Record(record) => self.set_record(record),
            ScrapeOutput::Raw(raw) => self.set_record(ScrapedRecord::from_json(&raw)),
            ScrapeOutput::Text(text) => {
                self.record = None;
                self.text_content = Some(text);
                self.content_format = Some(ContentFormat::Text);
            }
        }
        self.url = Some(url.to_string());
    }

    fn set_record(&mut self, record: ScrapedRecord) {
        self.text_content = Some(clean_text(&record.text));
        self.record = Some(record);
        self.content_format = Some(ContentFormat::Json);
    }

    pub fn record_extraction(&mut self, extraction: Extraction) {
        self.last_extraction = Some(extraction);
    }

    pub fn stats(&self) -> Option<ContentStats> {
        let text = self.text_content.as_deref()?;
        Some(ContentStats::of(text, self.record.as_ref()))
    }

    pub fn export(&self) -> Option<ExportDocument> {
        self.export_at(Local::now())
    }

    pub fn export_at(&self, now: DateTime<Local>) -> Option<ExportDocument> {
        let extraction = self.last_extraction.as_ref()?;

        Some(ExportDocument {
            url: extraction.url.clone().unwrap_or_else(|| "Unknown".to_string()),
            parse_description: extraction.description.clone(),
            result: extraction.result_text(),
            content_format: self
                .content_format
                .map(|format| format.tag().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            scraped_at: now.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        })
    }
}

pub const DEFAULT_SESSION_ID: &str = "default";

/// In-memory sessions keyed by a client-chosen id. Each session has its own
/// async lock so actions on one session run one at a time.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, id: &str) -> Arc<tokio::sync::Mutex<Session>> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.entry(id.to_string()).or_default().clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<tokio::sync::Mutex<Session>>> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
