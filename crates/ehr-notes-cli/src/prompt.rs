//! Terminal save-path picker.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use ehr_notes_core::codec::sanitize_file_name;
use ehr_notes_core::FilePicker;

/// Asks for a save path on a line-based terminal.
///
/// An empty answer accepts the suggested name inside `default_dir`; `q` or
/// end of input cancels.
pub struct PromptPicker<R, W> {
    input: R,
    output: W,
    default_dir: PathBuf,
}

impl<R: BufRead, W: Write> PromptPicker<R, W> {
    pub fn new(input: R, output: W, default_dir: PathBuf) -> Self {
        Self {
            input,
            output,
            default_dir,
        }
    }
}

impl<R: BufRead, W: Write> FilePicker for PromptPicker<R, W> {
    fn pick_save_path(&mut self, suggested_name: &str) -> io::Result<Option<PathBuf>> {
        let suggested = self.default_dir.join(sanitize_file_name(suggested_name));
        write!(
            self.output,
            "Save patient file as [{}] (q to cancel): ",
            suggested.display()
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        Ok(match line.trim() {
            "" => Some(suggested),
            "q" | "Q" => None,
            path => Some(PathBuf::from(path)),
        })
    }
}
