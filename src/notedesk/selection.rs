//! Shared vocabulary for the selection machine: the selection states, the
//! intent union the view dispatches, the outcomes it gets back, and the
//! confirmation request/response pairs that gate destructive transitions.

use crate::index::NoteIndex;
use std::path::PathBuf;

/// The selection/edit state. At most one note is open at a time.
///
/// Clean states carry no buffer: while `Viewing`, the buffer IS the note's
/// content, looked up by key at read time. "Buffer equals content iff not
/// dirty" therefore holds by construction, and an index mutation can never
/// leave a stale cached copy behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Unselected,
    Viewing { file_name: String },
    Editing { file_name: String, buffer: String },
}

impl Selection {
    /// Key of the open note, if any.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Selection::Unselected => None,
            Selection::Viewing { file_name } | Selection::Editing { file_name, .. } => {
                Some(file_name)
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self, Selection::Editing { .. })
    }

    /// The text the editor should show: the live buffer when dirty, the
    /// stored content otherwise. `None` when nothing is selected (or the
    /// selected note is gone from the index).
    pub fn buffer<'a>(&'a self, index: &'a NoteIndex) -> Option<&'a str> {
        match self {
            Selection::Unselected => None,
            Selection::Viewing { file_name } => {
                index.get(file_name).map(|note| note.content.as_str())
            }
            Selection::Editing { buffer, .. } => Some(buffer),
        }
    }
}

/// Everything the view can ask the core to do. A closed union: the view
/// owns no transition logic, it only renders state and forwards intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Open a note (clean) by file name.
    Select { file_name: String },
    /// Replace the open note's edit buffer with the editor's current text.
    Edit { buffer: String },
    /// Persist the open note's buffer.
    Save,
    /// Create an empty note named `stem` (suffix attached) and open it.
    Create { stem: String },
    /// Rename `file_name` to the new `stem` (suffix attached).
    Rename { file_name: String, stem: String },
    /// Delete a note, after its yes/no confirmation.
    Delete { file_name: String },
    /// Apply a search query to the note list.
    Search { query: String },
    /// Drop the search query, restoring the full list.
    ClearSearch,
    /// Re-read the base directory from disk.
    Refresh,
    /// Switch to a different base directory (from the directory picker).
    ChangeDirectory { dir: PathBuf },
    /// Close the application.
    Close,
}

/// What the embedder should do after a call into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed: the intent was a no-op, rejected, or cancelled.
    Unchanged,
    /// State changed; re-render from the session's read accessors.
    Updated,
    /// Show the described dialog, then call `Session::resolve` with the
    /// answer. Until then, further intents are rejected.
    Confirm(ConfirmRequest),
    /// The base directory changed: re-render and restart the watch
    /// subscription on the new directory.
    DirectoryChanged,
    /// No usable base directory; run the directory-selection flow and come
    /// back with `Intent::ChangeDirectory`.
    PickDirectory,
    /// The session agreed to close; tear down and exit.
    Exit,
}

/// Which dialog wording an unsaved-edits confirmation should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    NavigateAway,
    CloseApp,
}

/// A dialog the embedder must show. The subject is always a full file name;
/// strip the suffix for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmRequest {
    /// Three-way save / discard / cancel over the named dirty note.
    UnsavedEdits { kind: GuardKind, file_name: String },
    /// One-step yes/no before deleting the named note.
    Delete { file_name: String },
}

/// Answer to an `UnsavedEdits` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedChoice {
    ProceedWithSave,
    ProceedWithoutSave,
    /// Abort the enclosing action entirely, with no state change. Distinct
    /// from `ProceedWithoutSave` — the two must never be conflated.
    Cancel,
}

/// Answer to an outstanding [`ConfirmRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmResponse {
    Unsaved(UnsavedChoice),
    Delete { confirmed: bool },
}

/// The suspended action an outstanding confirmation will resume. Present
/// iff a [`ConfirmRequest`] is unanswered; doubles as the action-in-flight
/// token that makes `dispatch` reject new intents until resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Select { file_name: String },
    Create { stem: String },
    Search { query: String },
    ChangeDirectory { dir: PathBuf },
    Close,
    Rename { file_name: String, stem: String },
    /// Delete awaiting the unsaved-edits guard (stage one of two, only when
    /// the target is the open dirty note).
    DeleteGuard { file_name: String },
    /// Delete awaiting its yes/no.
    Delete { file_name: String },
}
