//! Patient record document.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::visit::Visit;

/// Schema tag identifying the document format. Files without it are rejected.
pub const SCHEMA_TAG: &str = "patient-v1";

/// The patient record: demographics plus an append-only visit list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    /// Document format tag
    pub schema: String,
    /// Assigned once when the record is created
    pub patient_id: String,
    /// Given name
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    /// Family name
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_name: String,
    /// Date of birth as entered (normally `YYYY-MM-DD`)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub birthdate: String,
    /// National or clinic identifier
    #[serde(default, deserialize_with = "null_as_empty")]
    pub personal_id: String,
    /// Visits in the order they were recorded
    #[serde(default)]
    pub visits: Vec<Visit>,
    /// Top-level members written by other tools, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Demographic fields written as `null` by other tools read as empty.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Demographic fields, overwritten wholesale on every save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demographics {
    pub first_name: String,
    pub last_name: String,
    pub birthdate: String,
    pub personal_id: String,
}

impl PatientRecord {
    /// Create an empty record with the given patient ID.
    pub fn new(patient_id: String, demographics: Demographics) -> Self {
        let mut record = Self {
            schema: SCHEMA_TAG.to_string(),
            patient_id,
            first_name: String::new(),
            last_name: String::new(),
            birthdate: String::new(),
            personal_id: String::new(),
            visits: Vec::new(),
            extra: Map::new(),
        };
        record.set_demographics(demographics);
        record
    }

    /// Replace all four demographic fields. Last write wins.
    pub fn set_demographics(&mut self, demographics: Demographics) {
        self.first_name = demographics.first_name;
        self.last_name = demographics.last_name;
        self.birthdate = demographics.birthdate;
        self.personal_id = demographics.personal_id;
    }

    /// Current demographic fields.
    pub fn demographics(&self) -> Demographics {
        Demographics {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birthdate: self.birthdate.clone(),
            personal_id: self.personal_id.clone(),
        }
    }

    /// Append a visit. Stored order is append order.
    pub fn push_visit(&mut self, visit: Visit) {
        self.visits.push(visit);
    }

    /// "Last, First" for display.
    pub fn display_name(&self) -> String {
        match (self.last_name.is_empty(), self.first_name.is_empty()) {
            (false, false) => format!("{}, {}", self.last_name, self.first_name),
            (false, true) => self.last_name.clone(),
            (true, _) => self.first_name.clone(),
        }
    }
}
