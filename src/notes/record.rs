//! Persisted note record

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One note per sanitized key.
///
/// On disk: `{"tag", "note", "last_updated", "update_count"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Raw tag the record was last saved under
    pub tag: String,

    /// Word-bounded note text
    pub note: String,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_updated: DateTime<Utc>,

    /// 1 on first save, +1 on every later save for the same key
    #[serde(default)]
    pub update_count: u64,
}

impl NoteRecord {
    /// Build the record that replaces `previous` (if any) for the same key.
    pub fn next(tag: &str, note: &str, previous: Option<&NoteRecord>) -> Self {
        Self {
            tag: tag.to_string(),
            note: note.to_string(),
            last_updated: Utc::now(),
            update_count: previous.map_or(0, |p| p.update_count) + 1,
        }
    }
}

/// Accept RFC 3339, or a naive ISO-8601 stamp (read as UTC) from older records.
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
