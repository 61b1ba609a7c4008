//! # Session
//!
//! The session is the single owner of editor state: the note index, the
//! current selection, the active search query, and the one confirmation
//! that may be in flight. UI clients drive it through three entry points
//! and render from its read accessors.
//!
//! ## Entry Points
//!
//! - [`Session::dispatch`] runs a user [`Intent`] against current state
//! - [`Session::resolve`] completes a confirmation the UI put to the user
//! - [`Session::handle_watch`] reconciles an external filesystem event
//!
//! All three return an [`Outcome`] telling the UI what to do next:
//! re-render, raise a dialog, fall back to the directory picker, or exit.
//!
//! ## One Action In Flight
//!
//! When an intent needs confirmation (unsaved edits, or a delete), the
//! session parks it as a pending action and answers `Outcome::Confirm`.
//! Until [`Session::resolve`] is called, every further intent is rejected
//! and every watch event is queued rather than applied. On resolution the
//! queued events are applied *first*, then the parked action resumes
//! against the refreshed index, so an external delete observed during the
//! dialog wins over the action it raced.
//!
//! ## Generic Over NoteFiles
//!
//! `Session<F: NoteFiles>` is generic over the file backend:
//! - Production: `Session<FsNoteFiles>`
//! - Testing: `Session<MemNoteFiles>`

use crate::config::AppConfig;
use crate::error::{NotedeskError, Result};
use crate::index::NoteIndex;
use crate::model::{self, NameError, Note};
use crate::search;
use crate::selection::{
    ConfirmRequest, ConfirmResponse, GuardKind, Intent, Outcome, PendingAction, Selection,
    UnsavedChoice,
};
use crate::store::NoteFiles;
use crate::watch::WatchEvent;
use chrono::Utc;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// What a batch of deferred watch events did to the session.
struct DeferredRefresh {
    changed: bool,
    directory_removed: bool,
}

/// How a single watch event landed.
enum WatchApplied {
    Nothing,
    Changed,
    DirectoryRemoved,
}

/// The synchronization and selection core of the editor.
///
/// Owns the authoritative in-memory state and keeps it consistent with
/// the notes directory through the [`NoteFiles`] backend. UI clients
/// hold exactly one session and never mutate state behind its back.
pub struct Session<F: NoteFiles> {
    files: F,
    config: AppConfig,
    config_dir: Option<PathBuf>,
    dir: Option<PathBuf>,
    index: NoteIndex,
    selection: Selection,
    query: String,
    pending: Option<PendingAction>,
    deferred: VecDeque<WatchEvent>,
}

impl<F: NoteFiles> Session<F> {
    /// Builds a session that is not yet attached to a directory.
    ///
    /// `config_dir` is where [`AppConfig`] is persisted; `None` disables
    /// persistence (tests, or embedders that manage config themselves).
    pub fn new(files: F, config: AppConfig, config_dir: Option<PathBuf>) -> Self {
        Session {
            files,
            config,
            config_dir,
            dir: None,
            index: NoteIndex::new(),
            selection: Selection::Unselected,
            query: String::new(),
            pending: None,
            deferred: VecDeque::new(),
        }
    }

    /// Attaches to the configured base directory and loads the index.
    ///
    /// Returns [`Outcome::PickDirectory`] when no directory is configured
    /// or the configured one no longer exists. The last-open bookmark is
    /// consumed here: it restores the selection once and is then cleared
    /// from the persisted config, so a crash never replays a stale one.
    pub fn init(&mut self) -> Result<Outcome> {
        let Some(dir) = self.config.base_dir.clone() else {
            return Ok(Outcome::PickDirectory);
        };
        let index = match self.load_index(&dir) {
            Ok(index) => index,
            Err(NotedeskError::DirectoryUnavailable(_)) => return Ok(Outcome::PickDirectory),
            Err(e) => return Err(e),
        };
        self.index = index;
        self.dir = Some(dir);
        if let Some(last) = self.config.last_open.take() {
            if self.index.contains(&last) {
                self.selection = Selection::Viewing { file_name: last };
            }
            let _ = self.save_config();
        }
        Ok(Outcome::Updated)
    }

    // --- Intents ---

    /// Runs a user intent against current state.
    ///
    /// While a confirmation is outstanding every intent is rejected with
    /// [`Outcome::Unchanged`]; the UI must [`Session::resolve`] first.
    pub fn dispatch(&mut self, intent: Intent) -> Result<Outcome> {
        if self.pending.is_some() {
            return Ok(Outcome::Unchanged);
        }
        match intent {
            Intent::Select { file_name } => self.on_select(file_name),
            Intent::Edit { buffer } => self.on_edit(buffer),
            Intent::Save => self.on_save(),
            Intent::Create { stem } => self.on_create(stem),
            Intent::Rename { file_name, stem } => self.on_rename(file_name, stem),
            Intent::Delete { file_name } => self.on_delete(file_name),
            Intent::Search { query } => self.on_search(query),
            Intent::ClearSearch => self.on_clear_search(),
            Intent::Refresh => self.on_refresh(),
            Intent::ChangeDirectory { dir } => self.on_change_directory(dir),
            Intent::Close => self.on_close(),
        }
    }

    /// Completes the outstanding confirmation with the user's answer.
    ///
    /// A stray call with nothing pending, or an answer of the wrong kind
    /// for the outstanding request, changes nothing; in the latter case
    /// the request stays outstanding. Watch events queued while the
    /// dialog was up are applied before the parked action resumes, and
    /// the action re-checks its subject against the refreshed index.
    pub fn resolve(&mut self, response: ConfirmResponse) -> Result<Outcome> {
        let Some(action) = self.pending.take() else {
            return Ok(Outcome::Unchanged);
        };
        let expects_delete = matches!(action, PendingAction::Delete { .. });
        let got_delete = matches!(response, ConfirmResponse::Delete { .. });
        if expects_delete != got_delete {
            self.pending = Some(action);
            return Ok(Outcome::Unchanged);
        }

        let refresh = self.drain_deferred()?;
        if refresh.directory_removed {
            return Ok(Outcome::PickDirectory);
        }

        match response {
            ConfirmResponse::Unsaved(UnsavedChoice::Cancel)
            | ConfirmResponse::Delete { confirmed: false } => Ok(if refresh.changed {
                Outcome::Updated
            } else {
                Outcome::Unchanged
            }),
            ConfirmResponse::Unsaved(UnsavedChoice::ProceedWithSave) => {
                self.save_open_note()?;
                self.resume(action)
            }
            ConfirmResponse::Unsaved(UnsavedChoice::ProceedWithoutSave) => {
                self.discard_open_edit();
                self.resume(action)
            }
            ConfirmResponse::Delete { confirmed: true } => self.resume(action),
        }
    }

    /// Reconciles one external filesystem event into the session.
    ///
    /// While a confirmation is outstanding the event is queued and
    /// applied on [`Session::resolve`].
    pub fn handle_watch(&mut self, event: WatchEvent) -> Result<Outcome> {
        if self.pending.is_some() {
            self.deferred.push_back(event);
            return Ok(Outcome::Unchanged);
        }
        let Some(dir) = self.dir.clone() else {
            return Ok(Outcome::Unchanged);
        };
        match self.apply_watch_event(&dir, event)? {
            WatchApplied::Nothing => Ok(Outcome::Unchanged),
            WatchApplied::Changed => Ok(Outcome::Updated),
            WatchApplied::DirectoryRemoved => Ok(Outcome::PickDirectory),
        }
    }

    // --- Read accessors ---

    /// Notes visible under the active query, newest first.
    pub fn notes(&self) -> Vec<&Note> {
        search::filter(&self.index, &self.query)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The indexed note behind the selection, if any.
    pub fn selected_note(&self) -> Option<&Note> {
        self.selection
            .file_name()
            .and_then(|name| self.index.get(name))
    }

    /// The text the editor pane should show: the live buffer when
    /// editing, the indexed content when viewing.
    pub fn buffer(&self) -> Option<&str> {
        self.selection.buffer(&self.index)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn files(&self) -> &F {
        &self.files
    }

    /// Whether a confirmation is outstanding and intents are locked out.
    pub fn awaiting_confirmation(&self) -> bool {
        self.pending.is_some()
    }

    /// Validates a name the user is typing, before any intent is sent.
    ///
    /// `current` is the file the name would replace (a rename's own
    /// entry), exempt from the collision check. Returns the full file
    /// name the stem would produce.
    pub fn validate_new_name(
        &self,
        stem: &str,
        current: Option<&str>,
    ) -> std::result::Result<String, NameError> {
        self.index.check_stem(stem, current)
    }

    // --- Intent handlers ---

    fn on_select(&mut self, file_name: String) -> Result<Outcome> {
        if self.selection.file_name() == Some(file_name.as_str()) {
            return Ok(Outcome::Unchanged);
        }
        if !self.index.contains(&file_name) {
            // Vanished underfoot; the next render drops the row anyway.
            return Ok(Outcome::Unchanged);
        }
        if self.selection.is_dirty() {
            return Ok(self.post_unsaved_guard(
                GuardKind::NavigateAway,
                PendingAction::Select { file_name },
            ));
        }
        self.apply_select(file_name)
    }

    fn on_edit(&mut self, buffer: String) -> Result<Outcome> {
        let Some(file_name) = self.selection.file_name().map(str::to_string) else {
            return Ok(Outcome::Unchanged);
        };
        let Some(note) = self.index.get(&file_name) else {
            self.selection = Selection::Unselected;
            return Ok(Outcome::Updated);
        };
        let next = if buffer == note.content {
            // Edited back to the saved text: the note is clean again.
            Selection::Viewing { file_name }
        } else {
            Selection::Editing { file_name, buffer }
        };
        if next == self.selection {
            return Ok(Outcome::Unchanged);
        }
        self.selection = next;
        Ok(Outcome::Updated)
    }

    fn on_save(&mut self) -> Result<Outcome> {
        if !self.selection.is_dirty() {
            return Ok(Outcome::Unchanged);
        }
        self.save_open_note()?;
        Ok(Outcome::Updated)
    }

    fn on_create(&mut self, stem: String) -> Result<Outcome> {
        self.index.check_stem(&stem, None)?;
        if self.selection.is_dirty() {
            return Ok(self.post_unsaved_guard(
                GuardKind::NavigateAway,
                PendingAction::Create { stem },
            ));
        }
        self.apply_create(stem)
    }

    fn on_rename(&mut self, file_name: String, stem: String) -> Result<Outcome> {
        if !self.index.contains(&file_name) {
            return Ok(Outcome::Unchanged);
        }
        let new_name = self.index.check_stem(&stem, Some(file_name.as_str()))?;
        if new_name == file_name {
            return Ok(Outcome::Unchanged);
        }
        // Only renaming the note whose edits would be lost needs the
        // guard; renaming any other note leaves the buffer alone.
        let open_and_dirty = self.selection.is_dirty()
            && self.selection.file_name() == Some(file_name.as_str());
        if open_and_dirty {
            self.pending = Some(PendingAction::Rename {
                file_name: file_name.clone(),
                stem,
            });
            return Ok(Outcome::Confirm(ConfirmRequest::UnsavedEdits {
                kind: GuardKind::NavigateAway,
                file_name,
            }));
        }
        self.apply_rename(file_name, stem)
    }

    fn on_delete(&mut self, file_name: String) -> Result<Outcome> {
        if !self.index.contains(&file_name) {
            return Ok(Outcome::Unchanged);
        }
        let open_and_dirty = self.selection.is_dirty()
            && self.selection.file_name() == Some(file_name.as_str());
        if open_and_dirty {
            // Unsaved edits first; the yes/no follows as its own stage.
            self.pending = Some(PendingAction::DeleteGuard {
                file_name: file_name.clone(),
            });
            return Ok(Outcome::Confirm(ConfirmRequest::UnsavedEdits {
                kind: GuardKind::NavigateAway,
                file_name,
            }));
        }
        self.pending = Some(PendingAction::Delete {
            file_name: file_name.clone(),
        });
        Ok(Outcome::Confirm(ConfirmRequest::Delete { file_name }))
    }

    fn on_search(&mut self, query: String) -> Result<Outcome> {
        if query == self.query {
            return Ok(Outcome::Unchanged);
        }
        if query.is_empty() {
            return self.on_clear_search();
        }
        if self.selection.is_dirty() {
            return Ok(self.post_unsaved_guard(
                GuardKind::NavigateAway,
                PendingAction::Search { query },
            ));
        }
        // A clean selection survives filtering, even off-screen.
        self.query = query;
        Ok(Outcome::Updated)
    }

    fn on_clear_search(&mut self) -> Result<Outcome> {
        if self.query.is_empty() {
            return Ok(Outcome::Unchanged);
        }
        self.query.clear();
        Ok(Outcome::Updated)
    }

    fn on_refresh(&mut self) -> Result<Outcome> {
        let Some(dir) = self.dir.clone() else {
            return Ok(Outcome::Unchanged);
        };
        self.reload(&dir)
    }

    fn on_change_directory(&mut self, dir: PathBuf) -> Result<Outcome> {
        if self.selection.is_dirty() {
            return Ok(self.post_unsaved_guard(
                GuardKind::NavigateAway,
                PendingAction::ChangeDirectory { dir },
            ));
        }
        self.apply_change_directory(dir)
    }

    fn on_close(&mut self) -> Result<Outcome> {
        if self.selection.is_dirty() {
            return Ok(self.post_unsaved_guard(GuardKind::CloseApp, PendingAction::Close));
        }
        Ok(Outcome::Exit)
    }

    // --- Resumption ---

    /// Parks `action` behind the unsaved-edits dialog. Callers have
    /// already established that the selection is dirty.
    fn post_unsaved_guard(&mut self, kind: GuardKind, action: PendingAction) -> Outcome {
        let file_name = self
            .selection
            .file_name()
            .unwrap_or_default()
            .to_string();
        self.pending = Some(action);
        Outcome::Confirm(ConfirmRequest::UnsavedEdits { kind, file_name })
    }

    /// Runs an action whose confirmation has been passed.
    ///
    /// Subjects are re-checked against the index: deferred events may
    /// have removed them while the dialog was up, and a vanished subject
    /// degrades the action to a no-op rather than an error.
    fn resume(&mut self, action: PendingAction) -> Result<Outcome> {
        let outcome = match action {
            PendingAction::Select { file_name } => self.apply_select(file_name)?,
            PendingAction::Create { stem } => self.apply_create(stem)?,
            PendingAction::Search { query } => {
                // A guarded search lands with nothing open: the filtered
                // list replaces the note the user chose to leave.
                self.selection = Selection::Unselected;
                self.query = query;
                Outcome::Updated
            }
            PendingAction::ChangeDirectory { dir } => self.apply_change_directory(dir)?,
            PendingAction::Close => Outcome::Exit,
            PendingAction::Rename { file_name, stem } => {
                if self.index.contains(&file_name) {
                    self.apply_rename(file_name, stem)?
                } else {
                    Outcome::Unchanged
                }
            }
            PendingAction::DeleteGuard { file_name } => {
                if self.index.contains(&file_name) {
                    self.pending = Some(PendingAction::Delete {
                        file_name: file_name.clone(),
                    });
                    Outcome::Confirm(ConfirmRequest::Delete { file_name })
                } else {
                    Outcome::Unchanged
                }
            }
            PendingAction::Delete { file_name } => self.apply_delete(file_name)?,
        };
        // Passing a guard always redrew something: a save, a dropped
        // buffer, or the deferred events applied on the way in.
        Ok(match outcome {
            Outcome::Unchanged => Outcome::Updated,
            other => other,
        })
    }

    // --- Appliers ---

    fn apply_select(&mut self, file_name: String) -> Result<Outcome> {
        if !self.index.contains(&file_name) {
            return Ok(Outcome::Unchanged);
        }
        self.selection = Selection::Viewing {
            file_name: file_name.clone(),
        };
        self.config.last_open = Some(file_name);
        let _ = self.save_config();
        Ok(Outcome::Updated)
    }

    fn apply_create(&mut self, stem: String) -> Result<Outcome> {
        let Some(dir) = self.dir.clone() else {
            return Ok(Outcome::Unchanged);
        };
        // Re-validate: deferred events may have taken the name since the
        // intent was posted.
        let file_name = self.index.check_stem(&stem, None)?;
        let note = self.files.create_note(&dir, &file_name)?;
        self.index.insert(note);
        self.query.clear();
        self.selection = Selection::Viewing {
            file_name: file_name.clone(),
        };
        self.config.last_open = Some(file_name);
        let _ = self.save_config();
        Ok(Outcome::Updated)
    }

    fn apply_rename(&mut self, file_name: String, stem: String) -> Result<Outcome> {
        let Some(dir) = self.dir.clone() else {
            return Ok(Outcome::Unchanged);
        };
        let new_name = self.index.check_stem(&stem, Some(file_name.as_str()))?;
        if new_name == file_name {
            return Ok(Outcome::Unchanged);
        }
        let now = Utc::now();
        // Disk first; a failure here leaves index and selection as they
        // were, still matching the directory.
        self.files.rename_note(&dir, &file_name, &new_name, now)?;
        self.index.rename(&file_name, &new_name, now)?;
        match &mut self.selection {
            Selection::Viewing { file_name: open } | Selection::Editing { file_name: open, .. }
                if *open == file_name =>
            {
                *open = new_name.clone();
            }
            _ => {}
        }
        if self.config.last_open.as_deref() == Some(file_name.as_str()) {
            self.config.last_open = Some(new_name);
            let _ = self.save_config();
        }
        Ok(Outcome::Updated)
    }

    fn apply_delete(&mut self, file_name: String) -> Result<Outcome> {
        let Some(dir) = self.dir.clone() else {
            return Ok(Outcome::Unchanged);
        };
        if !self.index.contains(&file_name) {
            return Ok(Outcome::Unchanged);
        }
        self.files.delete_note(&dir, &file_name)?;
        self.index.remove(&file_name);
        if self.selection.file_name() == Some(file_name.as_str()) {
            self.selection = Selection::Unselected;
        }
        Ok(Outcome::Updated)
    }

    fn apply_change_directory(&mut self, dir: PathBuf) -> Result<Outcome> {
        // The choice is persisted before the switch; on restart the app
        // comes back to the directory the user last picked.
        let previous = self.config.base_dir.replace(dir.clone());
        if let Err(e) = self.save_config() {
            self.config.base_dir = previous;
            return Err(e);
        }
        match self.load_index(&dir) {
            Ok(index) => {
                self.dir = Some(dir);
                self.index = index;
                self.selection = Selection::Unselected;
                self.query.clear();
                self.deferred.clear();
                Ok(Outcome::DirectoryChanged)
            }
            Err(NotedeskError::DirectoryUnavailable(_)) => {
                self.reset_to_picker();
                Ok(Outcome::PickDirectory)
            }
            Err(e) => Err(e),
        }
    }

    // --- Reconciliation ---

    fn apply_watch_event(&mut self, dir: &Path, event: WatchEvent) -> Result<WatchApplied> {
        match event {
            WatchEvent::Created { file_name } => {
                if !model::is_note_file(&file_name) || self.index.contains(&file_name) {
                    // Our own writes echo back through the watcher; a
                    // known name means there is nothing to reconcile.
                    return Ok(WatchApplied::Nothing);
                }
                match self.files.read_note(dir, &file_name)? {
                    Some(note) => {
                        self.index.insert(note);
                        Ok(WatchApplied::Changed)
                    }
                    None => Ok(WatchApplied::Nothing),
                }
            }
            WatchEvent::Removed { file_name } => {
                if self.index.remove(&file_name).is_none() {
                    return Ok(WatchApplied::Nothing);
                }
                if self.selection.file_name() == Some(file_name.as_str()) {
                    // The file is gone; there is nothing left to save, so
                    // no dialog, dirty or not.
                    self.selection = Selection::Unselected;
                }
                Ok(WatchApplied::Changed)
            }
            WatchEvent::DirectoryRemoved => {
                self.reset_to_picker();
                Ok(WatchApplied::DirectoryRemoved)
            }
        }
    }

    /// Applies every queued watch event in arrival order.
    fn drain_deferred(&mut self) -> Result<DeferredRefresh> {
        let mut refresh = DeferredRefresh {
            changed: false,
            directory_removed: false,
        };
        let Some(dir) = self.dir.clone() else {
            self.deferred.clear();
            return Ok(refresh);
        };
        while let Some(event) = self.deferred.pop_front() {
            match self.apply_watch_event(&dir, event)? {
                WatchApplied::Nothing => {}
                WatchApplied::Changed => refresh.changed = true,
                WatchApplied::DirectoryRemoved => {
                    refresh.directory_removed = true;
                    return Ok(refresh);
                }
            }
        }
        Ok(refresh)
    }

    /// Re-reads the directory and rebuilds the index.
    ///
    /// The selection carries across: a clean view refreshes in place, a
    /// dirty buffer is kept (snapping clean if the reloaded content now
    /// matches it), and a vanished note leaves nothing selected.
    fn reload(&mut self, dir: &Path) -> Result<Outcome> {
        let index = match self.load_index(dir) {
            Ok(index) => index,
            Err(NotedeskError::DirectoryUnavailable(_)) => {
                self.reset_to_picker();
                return Ok(Outcome::PickDirectory);
            }
            Err(e) => return Err(e),
        };
        self.index = index;
        self.query.clear();
        self.selection = match std::mem::replace(&mut self.selection, Selection::Unselected) {
            Selection::Viewing { file_name } if self.index.contains(&file_name) => {
                Selection::Viewing { file_name }
            }
            Selection::Editing { file_name, buffer } => match self.index.get(&file_name) {
                Some(note) if note.content == buffer => Selection::Viewing { file_name },
                Some(_) => Selection::Editing { file_name, buffer },
                None => Selection::Unselected,
            },
            _ => Selection::Unselected,
        };
        Ok(Outcome::Updated)
    }

    // --- Plumbing ---

    fn load_index(&self, dir: &Path) -> Result<NoteIndex> {
        if !self.files.directory_exists(dir) {
            return Err(NotedeskError::DirectoryUnavailable(dir.to_path_buf()));
        }
        Ok(NoteIndex::from_notes(self.files.list_notes(dir)?))
    }

    /// Writes the open buffer through to disk and marks the note clean.
    ///
    /// A failed write propagates with the buffer intact; nothing in
    /// memory changes until the file has.
    fn save_open_note(&mut self) -> Result<()> {
        let Selection::Editing { file_name, buffer } = &self.selection else {
            return Ok(());
        };
        if !self.index.contains(file_name) {
            self.selection = Selection::Unselected;
            return Ok(());
        }
        let Some(dir) = self.dir.clone() else {
            return Ok(());
        };
        let file_name = file_name.clone();
        let buffer = buffer.clone();
        self.files.write_note(&dir, &file_name, &buffer)?;
        let now = Utc::now();
        self.index.touch(&file_name, now, buffer)?;
        self.selection = Selection::Viewing { file_name };
        Ok(())
    }

    /// Drops the open buffer, keeping the note open at its saved text.
    fn discard_open_edit(&mut self) {
        if let Selection::Editing { file_name, .. } = &self.selection {
            self.selection = Selection::Viewing {
                file_name: file_name.clone(),
            };
        }
    }

    fn reset_to_picker(&mut self) {
        self.dir = None;
        self.index = NoteIndex::new();
        self.selection = Selection::Unselected;
        self.query.clear();
        self.pending = None;
        self.deferred.clear();
    }

    fn save_config(&self) -> Result<()> {
        match &self.config_dir {
            Some(dir) => self.config.save(dir),
            None => Ok(()),
        }
    }
}
