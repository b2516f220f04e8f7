//! JSON codec for patient files.
//!
//! Loading validates in two steps: the text must be JSON, and its `schema`
//! member must equal [`SCHEMA_TAG`]. Only then is the document read into a
//! [`PatientRecord`]. Nothing here touches session state; callers swap the
//! result in themselves.

mod save;

pub use save::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::models::{PatientRecord, SCHEMA_TAG};

/// Codec errors.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error(
        "Not a patient file: expected schema \"{}\", found {}",
        SCHEMA_TAG,
        .found.as_deref().unwrap_or("none")
    )]
    SchemaMismatch { found: Option<String> },

    #[error("Malformed patient record: {0}")]
    InvalidRecord(#[source] serde_json::Error),

    #[error("JSON serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Serialize a record as indented JSON.
pub fn to_json(record: &PatientRecord) -> CodecResult<String> {
    serde_json::to_string_pretty(record).map_err(CodecError::Serialize)
}

/// Parse and validate the text of a patient file.
pub fn parse_record(text: &str) -> CodecResult<PatientRecord> {
    let value: Value = serde_json::from_str(text).map_err(CodecError::InvalidJson)?;

    let schema = value.get("schema");
    if schema.and_then(Value::as_str) != Some(SCHEMA_TAG) {
        return Err(CodecError::SchemaMismatch {
            found: schema.map(|s| match s.as_str() {
                Some(tag) => tag.to_string(),
                None => s.to_string(),
            }),
        });
    }

    serde_json::from_value(value).map_err(CodecError::InvalidRecord)
}

/// Read a whole patient file and parse it.
pub fn load_file<P: AsRef<Path>>(path: P) -> CodecResult<PatientRecord> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let record = parse_record(&text)?;
    log::info!(
        "loaded patient record {} ({} visits) from {}",
        record.patient_id,
        record.visits.len(),
        path.display()
    );
    Ok(record)
}

/// Serialize a record and hand it to a save target under the suggested name.
pub fn save<T: SaveTarget + ?Sized>(
    record: &PatientRecord,
    suggested_name: &str,
    target: &mut T,
) -> CodecResult<SaveOutcome> {
    let json = to_json(record)?;
    let outcome = target.write(suggested_name, &json)?;
    match &outcome {
        SaveOutcome::Saved { location } => log::info!(
            "saved patient record {} to {}",
            record.patient_id,
            location.display()
        ),
        SaveOutcome::Cancelled => log::debug!("save of {} cancelled", suggested_name),
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Demographics, Visit};

    fn sample_record() -> PatientRecord {
        let mut record = PatientRecord::new(
            "p-1".into(),
            Demographics {
                first_name: "Ana".into(),
                last_name: "Ruiz".into(),
                birthdate: "1990-05-01".into(),
                personal_id: "A12-34".into(),
            },
        );
        record.push_visit(Visit::at(
            "v-1".into(),
            "2024-01-01T09:00:00.000Z".into(),
            "Primera".into(),
        ));
        record
    }

    #[test]
    fn test_to_json_is_indented() {
        let json = to_json(&sample_record()).unwrap();
        assert!(json.starts_with("{\n  \"schema\": \"patient-v1\""));
        assert!(json.contains("\n    {\n      \"visit_id\": \"v-1\""));
    }

    #[test]
    fn test_parse_round_trip() {
        let record = sample_record();
        let parsed = parse_record(&to_json(&record).unwrap()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_record("{ not json").unwrap_err();
        assert!(matches!(err, CodecError::InvalidJson(_)));

        let err = parse_record("").unwrap_err();
        assert!(matches!(err, CodecError::InvalidJson(_)));
    }

    #[test]
    fn test_parse_wrong_schema() {
        let err = parse_record(r#"{"schema":"patient-v2","patient_id":"p"}"#).unwrap_err();
        match err {
            CodecError::SchemaMismatch { found } => {
                assert_eq!(found.as_deref(), Some("patient-v2"))
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = parse_record(r#"{"patient_id":"p"}"#).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { found: None }));

        let err = parse_record(r#"[1, 2, 3]"#).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { found: None }));

        let err = parse_record(r#"{"schema":1}"#).unwrap_err();
        assert!(err.to_string().contains("found 1"));
    }

    #[test]
    fn test_parse_wrong_shape() {
        let err = parse_record(r#"{"schema":"patient-v1","patient_id":"p","visits":"none"}"#)
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidRecord(_)));

        let err = parse_record(r#"{"schema":"patient-v1"}"#).unwrap_err();
        assert!(matches!(err, CodecError::InvalidRecord(_)));
    }

    #[test]
    fn test_parse_keeps_unknown_members() {
        let text = r#"{
            "schema": "patient-v1",
            "patient_id": "p",
            "visits": [],
            "allergies": ["penicillin"]
        }"#;
        let record = parse_record(text).unwrap();
        assert_eq!(record.extra["allergies"][0], "penicillin");

        let again = to_json(&record).unwrap();
        assert!(again.contains("penicillin"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CodecError::Io { .. }));
        assert!(err.to_string().contains("here.json"));
    }
}
