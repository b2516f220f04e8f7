use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ehr_notes_core::{IdGenerator, IdStrategy, VisitForm};

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum IdStrategyArg {
    /// Check the platform and pick the best source
    Auto,
    Platform,
    SecureBytes,
    Weak,
}

impl IdStrategyArg {
    pub fn generator(self) -> IdGenerator {
        match self {
            Self::Auto => IdGenerator::detect(),
            Self::Platform => IdGenerator::with_strategy(IdStrategy::PlatformUuid),
            Self::SecureBytes => IdGenerator::with_strategy(IdStrategy::SecureBytes),
            Self::Weak => IdGenerator::with_strategy(IdStrategy::Weak),
        }
    }
}

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "ehr-notes")]
#[command(about = "Record patient visit notes in portable JSON files")]
#[command(version)]
pub struct Cli {
    /// Identifier source
    #[arg(long, value_enum, global = true, env = "EHR_NOTES_ID_STRATEGY", default_value = "auto")]
    pub id_strategy: IdStrategyArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a visit and save the patient file
    Record(RecordArgs),

    /// Print the visit history of a patient file, most recent first
    History {
        /// Patient file to read
        file: PathBuf,
    },

    /// Print freshly generated identifiers
    Id {
        /// How many to print
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Existing patient file; its demographics fill any field not given here
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    /// Date of birth, e.g. 1990-05-01
    #[arg(long)]
    pub birthdate: Option<String>,

    #[arg(long)]
    pub personal_id: Option<String>,

    /// Visit notes
    #[arg(short, long)]
    pub notes: String,

    /// Save to this path (replacing it) instead of the download directory
    #[arg(short, long, conflicts_with = "interactive")]
    pub output: Option<PathBuf>,

    /// Ask for the save path on the terminal
    #[arg(short, long)]
    pub interactive: bool,

    /// Directory for saves without --output [default: the user's Downloads]
    #[arg(long, env = "EHR_NOTES_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,
}

impl RecordArgs {
    /// Overlay the fields given on the command line onto the form.
    pub fn apply_to(&self, form: &mut VisitForm) {
        let overlay = [
            (&self.first_name, &mut form.first_name),
            (&self.last_name, &mut form.last_name),
            (&self.birthdate, &mut form.birthdate),
            (&self.personal_id, &mut form.personal_id),
        ];
        for (arg, field) in overlay {
            if let Some(value) = arg {
                field.clone_from(value);
            }
        }
        form.notes.clone_from(&self.notes);
    }
}
