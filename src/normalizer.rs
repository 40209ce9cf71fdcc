//! Shapes the scrape service payload into a fixed record.
//!
//! The scrape service omits keys freely, so every accessor here falls back to
//! an empty value instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNTITLED: &str = "No title found";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub description: String,
    pub keywords: String,
    pub author: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedRecord {
    pub title: String,
    pub text: String,
    pub links: Vec<String>,
    pub images: Vec<String>,
    pub meta: PageMeta,
    pub headings: Vec<String>,
    pub url: String,
}

impl ScrapedRecord {
    pub fn from_json(raw: &Value) -> Self {
        let meta = raw.get("meta").unwrap_or(&Value::Null);

        ScrapedRecord {
            title: string_field(raw, "title"),
            text: string_field(raw, "text"),
            links: string_list(raw, "links"),
            images: string_list(raw, "images"),
            meta: PageMeta {
                description: string_field(meta, "description"),
                keywords: string_field(meta, "keywords"),
                author: string_field(meta, "author"),
            },
            headings: string_list(raw, "headings"),
            url: string_field(raw, "url"),
        }
    }

    /// Title shown in summaries: the page title, then the first heading.
    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if !title.is_empty() {
            return title;
        }

        self.headings
            .first()
            .map(|heading| heading.trim())
            .filter(|heading| !heading.is_empty())
            .unwrap_or(UNTITLED)
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// Non-string entries carry no usable URL or heading text, so they are dropped.
fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Removes blank lines and surrounding whitespace from every remaining line.
pub fn clean_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(trimmed);
    }

    result
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    pub characters: usize,
    pub words: usize,
    pub links: usize,
    pub images: usize,
    pub headings: usize,
}

impl ContentStats {
    pub fn of(text: &str, record: Option<&ScrapedRecord>) -> Self {
        let mut stats = ContentStats {
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
            ..Default::default()
        };

        if let Some(record) = record {
            stats.links = record.links.len();
            stats.images = record.images.len();
            stats.headings = record.headings.len();
        }

        stats
    }
}
