use super::NoteFiles;
use crate::error::{NotedeskError, Result};
use crate::model::{self, Note};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use uuid::Uuid;

/// Production file access: notes are plain files directly under the base
/// directory, nothing else on disk belongs to us.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsNoteFiles;

impl FsNoteFiles {
    pub fn new() -> Self {
        Self
    }
}

impl NoteFiles for FsNoteFiles {
    fn list_notes(&self, dir: &Path) -> Result<Vec<Note>> {
        let mut notes = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                // Non-UTF-8 names cannot round-trip through the index keys.
                Err(_) => continue,
            };
            if !model::is_note_file(&name) {
                continue;
            }
            if !entry.file_type()?.is_file() {
                continue;
            }
            // A file deleted mid-listing reads back as None; skip it.
            if let Some(note) = self.read_note(dir, &name)? {
                notes.push(note);
            }
        }
        Ok(notes)
    }

    fn read_note(&self, dir: &Path, file_name: &str) -> Result<Option<Note>> {
        let path = dir.join(file_name);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(Note::new(file_name, metadata.modified()?.into(), content)))
    }

    fn write_note(&self, dir: &Path, file_name: &str, content: &str) -> Result<()> {
        // Write to a dot-prefixed temp file, then rename into place. The
        // dot prefix keeps the watch from ever seeing the intermediate.
        let tmp = dir.join(format!(".{}-{}.tmp", file_name, Uuid::new_v4()));
        fs::write(&tmp, content)?;
        fs::rename(&tmp, dir.join(file_name))?;
        Ok(())
    }

    fn create_note(&self, dir: &Path, file_name: &str) -> Result<Note> {
        let path = dir.join(file_name);
        // Open in append mode: creates an empty file, or adopts an existing
        // one without truncating it.
        fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)?;
        self.read_note(dir, file_name)?
            .ok_or_else(|| NotedeskError::NoteNotFound(file_name.to_string()))
    }

    fn delete_note(&self, dir: &Path, file_name: &str) -> Result<()> {
        match fs::remove_file(dir.join(file_name)) {
            Ok(()) => Ok(()),
            // Already gone: the goal state holds.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn rename_note(&self, dir: &Path, old: &str, new: &str, ts: DateTime<Utc>) -> Result<()> {
        let old_path = dir.join(old);
        // Stamp the mtime on the old path first: rename preserves it, and a
        // failure at either step leaves the file addressable under exactly
        // one name with the index untouched.
        let file = fs::OpenOptions::new().write(true).open(&old_path)?;
        file.set_modified(ts.into())?;
        drop(file);
        fs::rename(&old_path, dir.join(new))?;
        Ok(())
    }

    fn directory_exists(&self, dir: &Path) -> bool {
        dir.is_dir()
    }
}
