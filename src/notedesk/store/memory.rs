use super::NoteFiles;
use crate::error::Result;
use crate::model::{self, Note};
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Clone)]
struct FileEntry {
    content: String,
    mtime: DateTime<Utc>,
}

/// In-memory file access for testing.
///
/// Uses `RefCell` for interior mutability since the core is single-threaded.
/// This keeps the `NoteFiles` trait at `&self` without locking.
#[derive(Default)]
pub struct MemNoteFiles {
    dirs: RefCell<HashMap<PathBuf, BTreeMap<String, FileEntry>>>,
    simulate_write_error: RefCell<bool>,
}

fn not_found() -> std::io::Error {
    std::io::Error::from(ErrorKind::NotFound)
}

fn write_error() -> std::io::Error {
    std::io::Error::other("simulated write error")
}

impl MemNoteFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `dir` exist (empty) if it doesn't already.
    pub fn create_dir(&self, dir: &Path) {
        self.dirs
            .borrow_mut()
            .entry(dir.to_path_buf())
            .or_default();
    }

    /// Drop `dir` and everything in it, simulating an external removal of
    /// the watched directory.
    pub fn remove_dir(&self, dir: &Path) {
        self.dirs.borrow_mut().remove(dir);
    }

    /// Place a file directly, creating `dir` as needed.
    pub fn seed(&self, dir: &Path, file_name: &str, mtime: DateTime<Utc>, content: &str) {
        self.dirs
            .borrow_mut()
            .entry(dir.to_path_buf())
            .or_default()
            .insert(
                file_name.to_string(),
                FileEntry {
                    content: content.to_string(),
                    mtime,
                },
            );
    }

    /// Enable write/create/rename error simulation for testing error
    /// handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Test helper to set a file's mtime directly. Returns true if the file
    /// existed and was updated.
    pub fn set_modified(&self, dir: &Path, file_name: &str, mtime: DateTime<Utc>) -> bool {
        let mut dirs = self.dirs.borrow_mut();
        if let Some(entry) = dirs.get_mut(dir).and_then(|files| files.get_mut(file_name)) {
            entry.mtime = mtime;
            true
        } else {
            false
        }
    }

    /// Raw content of a file, bypassing the suffix filter. For assertions.
    pub fn content_of(&self, dir: &Path, file_name: &str) -> Option<String> {
        self.dirs
            .borrow()
            .get(dir)
            .and_then(|files| files.get(file_name))
            .map(|entry| entry.content.clone())
    }
}

impl NoteFiles for MemNoteFiles {
    fn list_notes(&self, dir: &Path) -> Result<Vec<Note>> {
        let dirs = self.dirs.borrow();
        let files = dirs.get(dir).ok_or_else(not_found)?;
        Ok(files
            .iter()
            .filter(|(name, _)| model::is_note_file(name))
            .map(|(name, entry)| Note::new(name.clone(), entry.mtime, entry.content.clone()))
            .collect())
    }

    fn read_note(&self, dir: &Path, file_name: &str) -> Result<Option<Note>> {
        let dirs = self.dirs.borrow();
        Ok(dirs
            .get(dir)
            .and_then(|files| files.get(file_name))
            .map(|entry| Note::new(file_name, entry.mtime, entry.content.clone())))
    }

    fn write_note(&self, dir: &Path, file_name: &str, content: &str) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(write_error().into());
        }
        let mut dirs = self.dirs.borrow_mut();
        let files = dirs.get_mut(dir).ok_or_else(not_found)?;
        files.insert(
            file_name.to_string(),
            FileEntry {
                content: content.to_string(),
                mtime: Utc::now(),
            },
        );
        Ok(())
    }

    fn create_note(&self, dir: &Path, file_name: &str) -> Result<Note> {
        if *self.simulate_write_error.borrow() {
            return Err(write_error().into());
        }
        let mut dirs = self.dirs.borrow_mut();
        let files = dirs.get_mut(dir).ok_or_else(not_found)?;
        // Append-open semantics: an existing file is adopted untouched.
        let entry = files
            .entry(file_name.to_string())
            .or_insert_with(|| FileEntry {
                content: String::new(),
                mtime: Utc::now(),
            });
        Ok(Note::new(file_name, entry.mtime, entry.content.clone()))
    }

    fn delete_note(&self, dir: &Path, file_name: &str) -> Result<()> {
        let mut dirs = self.dirs.borrow_mut();
        if let Some(files) = dirs.get_mut(dir) {
            files.remove(file_name);
        }
        Ok(())
    }

    fn rename_note(&self, dir: &Path, old: &str, new: &str, ts: DateTime<Utc>) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(write_error().into());
        }
        let mut dirs = self.dirs.borrow_mut();
        let files = dirs.get_mut(dir).ok_or_else(not_found)?;
        let mut entry = files.remove(old).ok_or_else(not_found)?;
        entry.mtime = ts;
        files.insert(new.to_string(), entry);
        Ok(())
    }

    fn directory_exists(&self, dir: &Path) -> bool {
        self.dirs.borrow().contains_key(dir)
    }
}

/// Pre-seeded `MemNoteFiles` builders for tests.
#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    pub const DIR: &str = "/notes";

    pub fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    pub struct FilesFixture {
        files: MemNoteFiles,
        dir: PathBuf,
    }

    impl Default for FilesFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FilesFixture {
        pub fn new() -> Self {
            let files = MemNoteFiles::new();
            let dir = PathBuf::from(DIR);
            files.create_dir(&dir);
            Self { files, dir }
        }

        /// Seed a note; `stem` gets the suffix attached.
        pub fn with_note(self, stem: &str, millis: i64, content: &str) -> Self {
            self.files
                .seed(&self.dir, &model::file_name(stem), at(millis), content);
            self
        }

        pub fn build(self) -> (MemNoteFiles, PathBuf) {
            (self.files, self.dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{at, FilesFixture};
    use super::*;

    #[test]
    fn list_filters_to_note_files() {
        let (files, dir) = FilesFixture::new().with_note("a", 100, "alpha").build();
        files.seed(&dir, "notes.md", at(200), "wrong suffix");
        files.seed(&dir, ".hidden.txt", at(300), "dotfile");

        let listed = files.list_notes(&dir).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].file_name, "a.txt");
    }

    #[test]
    fn read_of_missing_file_is_none() {
        let (files, dir) = FilesFixture::new().build();
        assert!(files.read_note(&dir, "ghost.txt").unwrap().is_none());
    }

    #[test]
    fn create_adopts_existing_file() {
        let (files, dir) = FilesFixture::new().with_note("kept", 100, "old text").build();
        let note = files.create_note(&dir, "kept.txt").unwrap();
        assert_eq!(note.content, "old text");
        assert_eq!(note.last_modified, at(100));
    }

    #[test]
    fn simulated_write_error_surfaces_as_io() {
        let (files, dir) = FilesFixture::new().build();
        files.set_simulate_write_error(true);
        assert!(files.write_note(&dir, "a.txt", "x").is_err());
        assert!(files.create_note(&dir, "a.txt").is_err());

        files.set_simulate_write_error(false);
        assert!(files.write_note(&dir, "a.txt", "x").is_ok());
    }

    #[test]
    fn rename_of_missing_file_errors() {
        let (files, dir) = FilesFixture::new().build();
        assert!(files.rename_note(&dir, "ghost.txt", "new.txt", at(1)).is_err());
    }

    #[test]
    fn rename_restamps_mtime() {
        let (files, dir) = FilesFixture::new().with_note("a", 100, "alpha").build();
        files.rename_note(&dir, "a.txt", "b.txt", at(900)).unwrap();

        let note = files.read_note(&dir, "b.txt").unwrap().unwrap();
        assert_eq!(note.last_modified, at(900));
        assert_eq!(note.content, "alpha");
        assert!(files.read_note(&dir, "a.txt").unwrap().is_none());
    }

    #[test]
    fn delete_of_missing_file_succeeds() {
        let (files, dir) = FilesFixture::new().build();
        assert!(files.delete_note(&dir, "ghost.txt").is_ok());
    }
}
