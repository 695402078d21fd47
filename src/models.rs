//! Core data models for the document catalog.
//!
//! These types represent the catalog entries that flow from the document
//! store API into the in-memory snapshot and out through the query engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One catalog entry as published by the document store.
///
/// Every named field carries `#[serde(default)]`: the catalog passes entries
/// through without shape validation, and a missing field must deserialize as
/// its empty value rather than reject the whole snapshot. Fields the client
/// does not understand round-trip untouched through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique within a single snapshot; stable across updates.
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub filename: String,
    /// Classification bucket id. Unrecognized values are tolerated.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(default)]
    pub extracted_text_preview: String,
    /// Classifier confidence, interpreted as a percentage for display.
    /// Not clamped on ingest; the source does not guarantee a range.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub file_type: String,
    /// Open-ended fields the client does not model (tags, timestamps, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Document {
    /// Confidence clamped to a displayable `0..=100` percentage.
    pub fn confidence_pct(&self) -> f64 {
        self.confidence.clamp(0.0, 100.0)
    }

    /// Searchable text of the `tags` field, when one is present in `extra`.
    ///
    /// Accepts either a plain string or an array of strings; anything else
    /// is treated as absent.
    pub fn tags_text(&self) -> Option<String> {
        match self.extra.get("tags")? {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => {
                let tags: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
                if tags.is_empty() {
                    None
                } else {
                    Some(tags.join(" "))
                }
            }
            _ => None,
        }
    }
}
