use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::normalizer::{clean_text, ScrapedRecord};

#[derive(Serialize)]
struct ScrapePayload<'a> {
    url: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeFormat {
    Json,
    Text,
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutput {
    Record(ScrapedRecord),
    Text(String),
    Raw(Value),
}

/// Gateway to the hosted scrape endpoint. One POST per call, no retries.
#[derive(Clone)]
pub struct ScrapeClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl ScrapeClient {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.serper_api_key, &config.scrape_url, config.scrape_timeout)
    }

    /// Returns the service payload, or `None` on any failure. Non-200
    /// statuses and transport errors are indistinguishable to the caller.
    pub async fn scrape(&self, url: &str) -> Option<Value> {
        info!(url, "Scraping website");

        match self.fetch(url).await {
            Ok(data) => {
                info!(url, "Successfully scraped content");
                Some(data)
            }
            Err(err) => {
                warn!(url, error = %err, "Scrape request failed");
                None
            }
        }
    }

    /// Like `scrape`, but an empty payload, or empty text in text mode, also
    /// counts as no data.
    pub async fn scrape_and_process(&self, url: &str, format: ScrapeFormat) -> Option<ScrapeOutput> {
        let raw = self.scrape(url).await?;
        if is_empty_payload(&raw) {
            warn!(url, "Scrape service returned an empty payload");
            return None;
        }

        match format {
            ScrapeFormat::Json => Some(ScrapeOutput::Record(ScrapedRecord::from_json(&raw))),
            ScrapeFormat::Text => {
                let text = clean_text(raw.get("text").and_then(Value::as_str).unwrap_or_default());
                if text.is_empty() {
                    warn!(url, "Scraped page has no text");
                    return None;
                }
                Some(ScrapeOutput::Text(text))
            }
            ScrapeFormat::Raw => Some(ScrapeOutput::Raw(raw)),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&ScrapePayload { url })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::FetchError(format!("{} - {}", status, body)));
        }

        let data = response.json::<Value>().await?;
        Ok(data)
    }
}

fn is_empty_payload(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
