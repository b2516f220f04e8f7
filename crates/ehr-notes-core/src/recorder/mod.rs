//! Visit recording and the session that holds the current record.
//!
//! Flow for one visit: validate form → copy (or create) record → overwrite
//! demographics → append visit → save → swap the copy into the session.
//! The session only changes after the file is written.

mod filename;
mod form;

pub use filename::*;
pub use form::*;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::{self, CodecError, CodecResult, SaveOutcome, SaveTarget};
use crate::history::render_history;
use crate::ids::IdGenerator;
use crate::models::{PatientRecord, Visit};

/// Recorder errors.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Please complete all patient information before saving (missing: {})", join_fields(.0))]
    MissingDemographics(Vec<FormField>),

    #[error("Please enter the visit notes before saving")]
    MissingNotes,

    #[error("Save failed: {0}")]
    Save(#[from] CodecError),
}

pub type RecordResult<T> = Result<T, RecordError>;

fn join_fields(fields: &[FormField]) -> String {
    fields
        .iter()
        .map(FormField::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of a visit recording that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Record written and now current in the session
    Saved {
        location: PathBuf,
        filename: String,
        visit_id: String,
    },
    /// User dismissed the save; session and form unchanged
    Cancelled,
}

/// Application state: the currently loaded record, if any.
#[derive(Debug, Default)]
pub struct Session {
    record: Option<PatientRecord>,
    ids: IdGenerator,
}

impl Session {
    /// Empty session with a detected identifier strategy.
    pub fn new() -> Self {
        Self::with_ids(IdGenerator::detect())
    }

    /// Empty session using the given identifier generator.
    pub fn with_ids(ids: IdGenerator) -> Self {
        Self { record: None, ids }
    }

    /// The current record.
    pub fn record(&self) -> Option<&PatientRecord> {
        self.record.as_ref()
    }

    /// Replace the current record with one parsed from text.
    /// On error the current record is left as it was.
    pub fn load_text(&mut self, text: &str) -> CodecResult<&PatientRecord> {
        let record = codec::parse_record(text)?;
        log::info!(
            "loaded patient record {} ({} visits)",
            record.patient_id,
            record.visits.len()
        );
        Ok(&*self.record.insert(record))
    }

    /// Replace the current record with one read from a file.
    /// On error the current record is left as it was.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> CodecResult<&PatientRecord> {
        let record = codec::load_file(path)?;
        Ok(&*self.record.insert(record))
    }

    /// Visit history of the current record.
    pub fn history(&self) -> String {
        render_history(self.record.as_ref())
    }

    /// Forget the current record.
    pub fn clear(&mut self) {
        self.record = None;
    }

    /// Record one visit from the form and save the whole record.
    ///
    /// On [`RecordOutcome::Saved`] the session takes the new record and the
    /// form's notes are cleared; demographics stay filled in. Validation
    /// errors, save errors and cancellation change nothing.
    pub fn record_visit<T: SaveTarget + ?Sized>(
        &mut self,
        form: &mut VisitForm,
        target: &mut T,
    ) -> RecordResult<RecordOutcome> {
        let valid = form.validate()?;

        let mut record = match &self.record {
            Some(current) => {
                let mut record = current.clone();
                record.set_demographics(valid.demographics);
                record
            }
            None => PatientRecord::new(self.ids.generate(), valid.demographics),
        };

        let visit_id = self.ids.generate();
        record.push_visit(Visit::new(visit_id.clone(), valid.notes));

        let filename = visit_filename(&record.demographics());
        match codec::save(&record, &filename, target)? {
            SaveOutcome::Saved { location } => {
                self.record = Some(record);
                form.notes.clear();
                Ok(RecordOutcome::Saved {
                    location,
                    filename,
                    visit_id,
                })
            }
            SaveOutcome::Cancelled => Ok(RecordOutcome::Cancelled),
        }
    }
}
