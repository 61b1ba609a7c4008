use chrono::{DateTime, Utc};
use thiserror::Error;

/// Notes are exactly the files in the base directory carrying this suffix.
pub const NOTE_SUFFIX: &str = ".txt";

/// Characters rejected in note names: path separators plus everything some
/// supported filesystem reserves.
pub const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Why a proposed note name was rejected. Each variant renders as the
/// validation message shown at the input field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("The note name cannot be blank")]
    Empty,

    #[error("The note name cannot contain '{0}'")]
    Reserved(char),

    #[error("The note name cannot start with '.'")]
    Hidden,

    #[error("A note named '{0}' already exists")]
    Taken(String),
}

/// A single note. `file_name` (suffix included) is the unique key; the
/// display name is always derived from it, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub file_name: String,
    pub last_modified: DateTime<Utc>,
    pub content: String,
}

impl Note {
    pub fn new(
        file_name: impl Into<String>,
        last_modified: DateTime<Utc>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            last_modified,
            content: content.into(),
        }
    }

    /// The name shown to the user: the file name minus the note suffix.
    pub fn display_name(&self) -> &str {
        display_name(&self.file_name)
    }
}

/// Strips the note suffix for display. A name without the suffix passes
/// through unchanged.
pub fn display_name(file_name: &str) -> &str {
    file_name.strip_suffix(NOTE_SUFFIX).unwrap_or(file_name)
}

/// Reattaches the note suffix to a display-name stem.
pub fn file_name(stem: &str) -> String {
    format!("{}{}", stem, NOTE_SUFFIX)
}

/// Whether a directory entry name counts as a note: carries the suffix and
/// is not a dotfile. Dotfiles never reach the index because the watch
/// ignores them; admitting one anywhere else would desynchronize the two.
pub fn is_note_file(file_name: &str) -> bool {
    file_name.ends_with(NOTE_SUFFIX) && !file_name.starts_with('.')
}

/// Checks a proposed display-name stem for legality (not for collisions —
/// the index owns that half, see `NoteIndex::check_stem`).
pub fn validate_stem(stem: &str) -> Result<(), NameError> {
    if stem.trim().is_empty() {
        return Err(NameError::Empty);
    }
    if stem.starts_with('.') {
        return Err(NameError::Hidden);
    }
    if let Some(c) = stem.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(NameError::Reserved(c));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_strips_suffix() {
        assert_eq!(display_name("groceries.txt"), "groceries");
        assert_eq!(display_name("a.b.txt"), "a.b");
        assert_eq!(display_name("no-suffix"), "no-suffix");
    }

    #[test]
    fn file_name_reattaches_suffix() {
        assert_eq!(file_name("groceries"), "groceries.txt");
        assert_eq!(display_name(&file_name("todo list")), "todo list");
    }

    #[test]
    fn note_files_are_suffixed_non_dotfiles() {
        assert!(is_note_file("a.txt"));
        assert!(is_note_file("shopping list.txt"));
        assert!(!is_note_file("a.md"));
        assert!(!is_note_file(".hidden.txt"));
        assert!(!is_note_file(".txt"));
        assert!(!is_note_file("a"));
    }

    #[test]
    fn blank_stems_are_rejected() {
        assert_eq!(validate_stem(""), Err(NameError::Empty));
        assert_eq!(validate_stem("   "), Err(NameError::Empty));
    }

    #[test]
    fn reserved_characters_are_rejected() {
        assert_eq!(validate_stem("a/b"), Err(NameError::Reserved('/')));
        assert_eq!(validate_stem("a\\b"), Err(NameError::Reserved('\\')));
        assert_eq!(validate_stem("what?"), Err(NameError::Reserved('?')));
        assert_eq!(validate_stem("a:b"), Err(NameError::Reserved(':')));
    }

    #[test]
    fn leading_dot_is_rejected() {
        assert_eq!(validate_stem(".secret"), Err(NameError::Hidden));
        // A dot inside the name is fine.
        assert!(validate_stem("v1.2 notes").is_ok());
    }

    #[test]
    fn ordinary_stems_pass() {
        assert!(validate_stem("groceries").is_ok());
        assert!(validate_stem("meeting notes 2024").is_ok());
    }
}
