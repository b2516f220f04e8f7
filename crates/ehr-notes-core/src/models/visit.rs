//! Visit entries.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One dated note entry. Never edited after it is written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Visit {
    /// Unique visit ID
    pub visit_id: String,
    /// Creation time, RFC 3339 in UTC
    pub timestamp: String,
    /// Visit payload
    #[serde(default)]
    pub content: VisitContent,
}

/// Payload of a visit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VisitContent {
    /// Free-text clinical notes. The outer `None` means the key is absent,
    /// `Some(None)` an explicit `null`; both are written back as found.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<Option<String>>,
    /// Members written by other tools, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn present<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<String>>, D::Error> {
    Option::<String>::deserialize(deserializer).map(Some)
}

impl Visit {
    /// Create a visit stamped with the current time.
    pub fn new(visit_id: String, notes: String) -> Self {
        Self::at(visit_id, now_timestamp(), notes)
    }

    /// Create a visit with an explicit timestamp.
    pub fn at(visit_id: String, timestamp: String, notes: String) -> Self {
        Self {
            visit_id,
            timestamp,
            content: VisitContent {
                notes: Some(Some(notes)),
                extra: Map::new(),
            },
        }
    }

    /// Notes text, empty when the entry carries none.
    pub fn notes(&self) -> &str {
        self.content.notes.as_ref().and_then(Option::as_deref).unwrap_or("")
    }

    /// Calendar-day part of the timestamp (everything before the `T`).
    pub fn date(&self) -> &str {
        self.timestamp
            .split_once('T')
            .map_or(self.timestamp.as_str(), |(day, _)| day)
    }

    /// Timestamp as an instant, if it parses.
    ///
    /// Accepts RFC 3339, a zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC)
    /// and a bare `YYYY-MM-DD` (midnight UTC).
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc())
    }
}

/// Current time in the form written to patient files, e.g. `2024-03-15T10:20:30.123Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
