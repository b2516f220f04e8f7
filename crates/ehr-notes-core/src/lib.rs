//! EHR Notes Core Library
//!
//! Local-first patient visit notes kept in a portable JSON file.
//!
//! # Architecture
//!
//! ```text
//!   patient file ──► codec::parse_record ──► Session (current record)
//!                    (JSON + schema check)         │
//!                                                  ├──► history::render_history
//!                                                  │
//!   VisitForm ──► Session::record_visit ───────────┘
//!                   │ validate → copy → append visit
//!                   ▼
//!               codec::save ──► SaveTarget (picker or download dir)
//!                   │
//!                   └── Saved: session takes the new record
//! ```
//!
//! # Core Principle
//!
//! **The session only changes after a durable write.** Validation failures,
//! save failures and cancelled saves leave the loaded record untouched.
//!
//! # Modules
//!
//! - [`models`]: Domain types (PatientRecord, Visit, Demographics)
//! - [`ids`]: Version-4 identifier generation with fallback strategies
//! - [`codec`]: JSON load/save and save targets
//! - [`history`]: Reverse-chronological visit history text
//! - [`recorder`]: Form validation, file naming and the [`Session`]

pub mod codec;
pub mod history;
pub mod ids;
pub mod models;
pub mod recorder;

// Re-export commonly used types
pub use codec::{
    CodecError, DownloadTarget, FilePicker, FixedPathPicker, PickerTarget, SaveOutcome,
    SaveTarget,
};
pub use history::render_history;
pub use ids::{IdGenerator, IdStrategy};
pub use models::{Demographics, PatientRecord, Visit, VisitContent, SCHEMA_TAG};
pub use recorder::{
    visit_filename, FormField, RecordError, RecordOutcome, Session, VisitForm,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum EhrNotesError {
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Session error: {0}")]
    Session(String),
}

impl From<CodecError> for EhrNotesError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::InvalidJson(_)
            | CodecError::SchemaMismatch { .. }
            | CodecError::InvalidRecord(_) => EhrNotesError::InvalidFile(e.to_string()),
            CodecError::Serialize(_) => EhrNotesError::SerializationError(e.to_string()),
            CodecError::Io { .. } => EhrNotesError::Io(e.to_string()),
        }
    }
}

impl From<RecordError> for EhrNotesError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::Save(codec) => codec.into(),
            other => EhrNotesError::Validation(other.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for EhrNotesError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        EhrNotesError::Session(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

static PROCESS_IDS: OnceLock<IdGenerator> = OnceLock::new();

/// Generate a version-4 identifier. The strategy is detected on first use.
#[uniffi::export]
pub fn generate_id() -> String {
    PROCESS_IDS.get_or_init(IdGenerator::detect).generate()
}

/// Open an empty session. Saves without an explicit path go to `download_dir`.
#[uniffi::export]
pub fn open_session(download_dir: String) -> Arc<EhrNotesCore> {
    Arc::new(EhrNotesCore {
        session: Arc::new(Mutex::new(Session::new())),
        download_dir: PathBuf::from(download_dir),
    })
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe session wrapper for FFI.
#[derive(uniffi::Object)]
pub struct EhrNotesCore {
    session: Arc<Mutex<Session>>,
    download_dir: PathBuf,
}

#[uniffi::export]
impl EhrNotesCore {
    // =========================================================================
    // Loading
    // =========================================================================

    /// Load a record from JSON text. Replaces the current record on success.
    pub fn load_record_json(&self, json: String) -> Result<FfiRecordSummary, EhrNotesError> {
        let mut session = self.session.lock()?;
        let record = session.load_text(&json)?;
        Ok(record.into())
    }

    /// Load a record from a file. Replaces the current record on success.
    pub fn load_record_file(&self, path: String) -> Result<FfiRecordSummary, EhrNotesError> {
        let mut session = self.session.lock()?;
        let record = session.load_file(&path)?;
        Ok(record.into())
    }

    /// Current record as indented JSON, if one is loaded.
    pub fn current_record_json(&self) -> Result<Option<String>, EhrNotesError> {
        let session = self.session.lock()?;
        Ok(session.record().map(codec::to_json).transpose()?)
    }

    // =========================================================================
    // Visits
    // =========================================================================

    /// Visit history text, most recent first.
    pub fn render_history(&self) -> Result<String, EhrNotesError> {
        let session = self.session.lock()?;
        Ok(session.history())
    }

    /// Record a visit and save the record.
    ///
    /// `save_path` is the location the host's own picker returned; without it
    /// the file goes to the download directory.
    pub fn record_visit(
        &self,
        form: FfiVisitForm,
        save_path: Option<String>,
    ) -> Result<Option<FfiVisitSaved>, EhrNotesError> {
        let mut session = self.session.lock()?;
        let mut form: VisitForm = form.into();

        let outcome = match save_path {
            Some(path) => {
                let mut target = PickerTarget::new(FixedPathPicker::new(path));
                session.record_visit(&mut form, &mut target)?
            }
            None => {
                let mut target = DownloadTarget::new(&self.download_dir);
                session.record_visit(&mut form, &mut target)?
            }
        };

        Ok(match outcome {
            RecordOutcome::Saved {
                location,
                filename,
                visit_id,
            } => Some(FfiVisitSaved {
                location: location.display().to_string(),
                filename,
                visit_id,
            }),
            RecordOutcome::Cancelled => None,
        })
    }

    /// Forget the current record.
    pub fn clear(&self) -> Result<(), EhrNotesError> {
        let mut session = self.session.lock()?;
        session.clear();
        Ok(())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe form input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisitForm {
    pub first_name: String,
    pub last_name: String,
    pub birthdate: String,
    pub personal_id: String,
    pub notes: String,
}

impl From<FfiVisitForm> for VisitForm {
    fn from(form: FfiVisitForm) -> Self {
        VisitForm {
            first_name: form.first_name,
            last_name: form.last_name,
            birthdate: form.birthdate,
            personal_id: form.personal_id,
            notes: form.notes,
        }
    }
}

/// FFI-safe view of a loaded record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordSummary {
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: String,
    pub personal_id: String,
    pub visit_count: u32,
}

impl From<&PatientRecord> for FfiRecordSummary {
    fn from(record: &PatientRecord) -> Self {
        Self {
            patient_id: record.patient_id.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            birthdate: record.birthdate.clone(),
            personal_id: record.personal_id.clone(),
            visit_count: record.visits.len() as u32,
        }
    }
}

/// FFI-safe save result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisitSaved {
    pub location: String,
    pub filename: String,
    pub visit_id: String,
}
