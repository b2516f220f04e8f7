//! Save targets: where serialized records end up.
//!
//! [`PickerTarget`] asks a [`FilePicker`] for a destination and may be
//! cancelled. [`DownloadTarget`] drops the file into a download directory and
//! never cancels.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{CodecError, CodecResult};

/// Result of a save that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// File written
    Saved { location: PathBuf },
    /// User dismissed the picker; nothing written
    Cancelled,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// Destination for serialized patient files.
pub trait SaveTarget {
    /// Write the full contents under (or starting from) the suggested file name.
    fn write(&mut self, suggested_name: &str, contents: &str) -> CodecResult<SaveOutcome>;
}

/// Interactive choice of a save path. `Ok(None)` means the user cancelled.
pub trait FilePicker {
    fn pick_save_path(&mut self, suggested_name: &str) -> io::Result<Option<PathBuf>>;
}

/// A picker whose answer is known up front.
#[derive(Debug, Clone)]
pub struct FixedPathPicker {
    path: PathBuf,
}

impl FixedPathPicker {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl FilePicker for FixedPathPicker {
    fn pick_save_path(&mut self, _suggested_name: &str) -> io::Result<Option<PathBuf>> {
        Ok(Some(self.path.clone()))
    }
}

/// Saves to a path chosen by a picker, replacing any existing file atomically.
#[derive(Debug)]
pub struct PickerTarget<P> {
    picker: P,
}

impl<P: FilePicker> PickerTarget<P> {
    pub fn new(picker: P) -> Self {
        Self { picker }
    }
}

impl<P: FilePicker> SaveTarget for PickerTarget<P> {
    fn write(&mut self, suggested_name: &str, contents: &str) -> CodecResult<SaveOutcome> {
        let picked = self
            .picker
            .pick_save_path(suggested_name)
            .map_err(|source| CodecError::Io {
                path: PathBuf::from(suggested_name),
                source,
            })?;

        let Some(mut path) = picked else {
            return Ok(SaveOutcome::Cancelled);
        };
        if path.is_dir() {
            path.push(sanitize_file_name(suggested_name));
        }

        write_atomic(&path, contents)?;
        Ok(SaveOutcome::Saved { location: path })
    }
}

/// Saves into a download directory, numbering the name when it is taken.
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    dir: PathBuf,
}

impl DownloadTarget {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// The user's download directory, or the working directory when there is none.
    pub fn default_dir() -> PathBuf {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Default for DownloadTarget {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

impl SaveTarget for DownloadTarget {
    fn write(&mut self, suggested_name: &str, contents: &str) -> CodecResult<SaveOutcome> {
        fs::create_dir_all(&self.dir).map_err(|source| CodecError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let name = sanitize_file_name(suggested_name);
        let mut copy = 0u32;
        loop {
            let path = self.dir.join(numbered_name(&name, copy));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let written = file
                        .write_all(contents.as_bytes())
                        .and_then(|()| file.sync_all());
                    if let Err(source) = written {
                        drop(file);
                        let _ = fs::remove_file(&path);
                        return Err(CodecError::Io { path, source });
                    }
                    return Ok(SaveOutcome::Saved { location: path });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => copy += 1,
                Err(source) => return Err(CodecError::Io { path, source }),
            }
        }
    }
}

/// Write through a temporary sibling and rename over the destination.
/// A failed write leaves the previous file, if any, untouched.
fn write_atomic(path: &Path, contents: &str) -> CodecResult<()> {
    let io_err = |source: io::Error| CodecError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Replace characters that cannot appear in a single path component.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "patient.json".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `name.json` → `name (n).json`; copy 0 is the name itself.
fn numbered_name(name: &str, copy: u32) -> String {
    if copy == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, copy, ext),
        _ => format!("{} ({})", name, copy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dismiss;

    impl FilePicker for Dismiss {
        fn pick_save_path(&mut self, _suggested_name: &str) -> io::Result<Option<PathBuf>> {
            Ok(None)
        }
    }

    #[test]
    fn test_picker_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let mut target = PickerTarget::new(FixedPathPicker::new(&path));

        let outcome = target.write("ignored.json", "{}").unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Saved {
                location: path.clone()
            }
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_picker_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        fs::write(&path, "old").unwrap();

        let mut target = PickerTarget::new(FixedPathPicker::new(&path));
        target.write("out.json", "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_picker_directory_uses_suggested_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = PickerTarget::new(FixedPathPicker::new(dir.path()));

        let outcome = target.write("RUIZ_ANA_A1234.json", "{}").unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Saved {
                location: dir.path().join("RUIZ_ANA_A1234.json")
            }
        );
    }

    #[test]
    fn test_picker_cancelled() {
        let mut target = PickerTarget::new(Dismiss);
        let outcome = target.write("x.json", "{}").unwrap();
        assert_eq!(outcome, SaveOutcome::Cancelled);
        assert!(!outcome.is_saved());
    }

    #[test]
    fn test_picker_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let mut target = PickerTarget::new(FixedPathPicker::new(&path));

        let err = target.write("out.json", "{}").unwrap_err();
        assert!(matches!(err, CodecError::Io { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_download_numbers_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = DownloadTarget::new(dir.path());

        let first = target.write("RUIZ_ANA_A1234.json", "1").unwrap();
        let second = target.write("RUIZ_ANA_A1234.json", "2").unwrap();
        let third = target.write("RUIZ_ANA_A1234.json", "3").unwrap();

        let saved = |name: &str| SaveOutcome::Saved {
            location: dir.path().join(name),
        };
        assert_eq!(first, saved("RUIZ_ANA_A1234.json"));
        assert_eq!(second, saved("RUIZ_ANA_A1234 (1).json"));
        assert_eq!(third, saved("RUIZ_ANA_A1234 (2).json"));

        let original = fs::read_to_string(dir.path().join("RUIZ_ANA_A1234.json")).unwrap();
        assert_eq!(original, "1");
    }

    #[test]
    fn test_download_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("downloads");
        let mut target = DownloadTarget::new(&nested);

        assert!(target.write("a.json", "{}").unwrap().is_saved());
        assert!(nested.join("a.json").exists());
    }

    #[test]
    fn test_download_stays_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = DownloadTarget::new(dir.path());

        let outcome = target.write("../O/BRIEN_X_1.json", "{}").unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Saved {
                location: dir.path().join("_O_BRIEN_X_1.json")
            }
        );
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("RUIZ_ANA_A1234.json"), "RUIZ_ANA_A1234.json");
        assert_eq!(sanitize_file_name("a/b\\c.json"), "a_b_c.json");
        assert_eq!(sanitize_file_name(".."), "patient.json");
        assert_eq!(sanitize_file_name(""), "patient.json");
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name("a.json", 0), "a.json");
        assert_eq!(numbered_name("a.json", 3), "a (3).json");
        assert_eq!(numbered_name("noext", 1), "noext (1)");
        assert_eq!(numbered_name(".hidden", 1), ".hidden (1)");
    }
}
