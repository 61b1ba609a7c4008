//! # Persistence Layer
//!
//! This module defines the file-access abstraction for notedesk. The
//! [`NoteFiles`] trait is the injected seam between the in-memory core and
//! the directory of plain-text files it mirrors.
//!
//! ## Design Rationale
//!
//! File access is abstracted behind a trait to:
//! - Enable **testing** with `MemNoteFiles` (no filesystem needed, with
//!   settable mtimes and simulated write failures)
//! - Keep the state machine **decoupled** from storage details, so the same
//!   core drives any embedding shell
//!
//! ## Implementations
//!
//! - [`fs::FsNoteFiles`]: Production file-based access
//!   - Notes are the `.txt` files directly under the base directory
//!   - Writes are atomic: content lands in a dot-prefixed temp file that is
//!     renamed into place (the dot prefix also keeps the watch from seeing
//!     the intermediate file)
//!   - Rename stamps the file's mtime so on-disk ordering matches the index
//!
//! - [`memory::MemNoteFiles`]: In-memory access for testing
//!   - No persistence
//!   - Fast, isolated test execution
//!
//! ## Contract notes
//!
//! All methods take the base directory explicitly: the active directory is
//! session state, not storage state, and changes when the user picks a new
//! one. Reads of missing files are `Ok(None)`, never errors — a watch event
//! may outlive the file it describes. Deletes of missing files succeed: the
//! goal state already holds.

use crate::error::Result;
use crate::model::Note;
use chrono::{DateTime, Utc};
use std::path::Path;

pub mod fs;
pub mod memory;

/// Abstract interface to the watched directory's note files.
pub trait NoteFiles {
    /// Snapshot of every note file in `dir` (suffix-filtered, dotfiles
    /// skipped). Order is unspecified; the index sorts.
    fn list_notes(&self, dir: &Path) -> Result<Vec<Note>>;

    /// Read one note. Returns `Ok(None)` if the file does not exist.
    fn read_note(&self, dir: &Path, file_name: &str) -> Result<Option<Note>>;

    /// Replace a note's content. MUST be atomic: readers and the watch see
    /// either the old content or the new, never a torn write.
    fn write_note(&self, dir: &Path, file_name: &str, content: &str) -> Result<()>;

    /// Create an empty note file, or adopt an existing file of that name
    /// untouched. Returns the note as it exists on disk afterwards.
    fn create_note(&self, dir: &Path, file_name: &str) -> Result<Note>;

    /// Delete a note file. A file already gone counts as success.
    fn delete_note(&self, dir: &Path, file_name: &str) -> Result<()>;

    /// Rename a note file and stamp its modification time with `ts`, so a
    /// later listing orders it exactly where the index does.
    fn rename_note(&self, dir: &Path, old: &str, new: &str, ts: DateTime<Utc>) -> Result<()>;

    /// Whether `dir` currently exists as a directory.
    fn directory_exists(&self, dir: &Path) -> bool;
}
