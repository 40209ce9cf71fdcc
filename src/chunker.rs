use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// A piece of content destined for a prompt.
///
/// Objects that serialize within the limit are kept as-is rather than turned
/// into text, so a chunk sequence can mix both kinds depending on input size.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Chunk {
    Text(String),
    Structured(Value),
}

impl Chunk {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Chunk::Text(text) => Some(text),
            Chunk::Structured(_) => None,
        }
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::Text(text) => f.write_str(text),
            Chunk::Structured(value) => write!(f, "{}", value),
        }
    }
}

pub fn split_content(content: &Value, max_length: usize) -> Vec<Chunk> {
    match content {
        Value::String(text) => split_text(text, max_length).into_iter().map(Chunk::Text).collect(),
        Value::Object(_) => {
            // Value's Serialize impl cannot fail
            let serialized = serde_json::to_string_pretty(content).unwrap_or_default();
            if serialized.chars().count() > max_length {
                split_text(&serialized, max_length).into_iter().map(Chunk::Text).collect()
            } else {
                vec![Chunk::Structured(content.clone())]
            }
        }
        other => vec![Chunk::Structured(other.clone())],
    }
}

/// Splits on character boundaries into pieces of at most `max_length`
/// characters. Empty input produces no pieces; a zero limit acts as one.
pub fn split_text(text: &str, max_length: usize) -> Vec<String> {
    let max_length = max_length.max(1);
    let mut chunks = Vec::with_capacity(text.len() / max_length + 1);
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == max_length {
            chunks.push(text[start..idx].to_string());
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(text[start..].to_string());
    }

    chunks
}
