//! Visit entry form and its validation.

use std::fmt;

use crate::models::{Demographics, PatientRecord};

use super::{RecordError, RecordResult};

/// Demographic field of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    FirstName,
    LastName,
    Birthdate,
    PersonalId,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::FirstName => "first name",
            FormField::LastName => "last name",
            FormField::Birthdate => "birthdate",
            FormField::PersonalId => "personal ID",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw form input as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitForm {
    pub first_name: String,
    pub last_name: String,
    pub birthdate: String,
    pub personal_id: String,
    pub notes: String,
}

/// Form input that passed validation, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidVisit {
    pub demographics: Demographics,
    pub notes: String,
}

impl VisitForm {
    /// Show a freshly loaded record: demographics from the record, notes empty.
    pub fn fill_from(&mut self, record: &PatientRecord) {
        self.first_name = record.first_name.clone();
        self.last_name = record.last_name.clone();
        self.birthdate = record.birthdate.clone();
        self.personal_id = record.personal_id.clone();
        self.notes.clear();
    }

    /// Empty every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Check that every field is non-empty after trimming.
    ///
    /// Demographics are checked before notes; all missing demographic fields
    /// are reported together.
    pub fn validate(&self) -> RecordResult<ValidVisit> {
        let demographics = Demographics {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            birthdate: self.birthdate.trim().to_string(),
            personal_id: self.personal_id.trim().to_string(),
        };

        let missing: Vec<FormField> = [
            (FormField::FirstName, &demographics.first_name),
            (FormField::LastName, &demographics.last_name),
            (FormField::Birthdate, &demographics.birthdate),
            (FormField::PersonalId, &demographics.personal_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(RecordError::MissingDemographics(missing));
        }

        let notes = self.notes.trim();
        if notes.is_empty() {
            return Err(RecordError::MissingNotes);
        }

        Ok(ValidVisit {
            demographics,
            notes: notes.to_string(),
        })
    }
}
