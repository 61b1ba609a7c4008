use crate::error::{NotedeskError, Result};
use crate::model::{self, NameError, Note};
use chrono::{DateTime, Utc};

/// Authoritative in-memory mapping of the watched directory's notes.
///
/// Conceptually a map from `file_name` to [`Note`] with a derived display
/// order: newest `last_modified` first, file name as the tiebreak. The
/// backing `Vec` is re-sorted after every mutation, so [`NoteIndex::sorted`]
/// is a plain slice view and repeated calls without intervening mutation
/// observe the identical order. The tiebreak makes the comparator a total
/// order, so equal timestamps cannot flip between calls.
///
/// The index mirrors the directory's note files exactly, except during the
/// window between an external change notification and its reconciliation
/// pass (see `Session::handle_watch`).
#[derive(Debug, Clone, Default)]
pub struct NoteIndex {
    notes: Vec<Note>,
}

impl NoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from a directory snapshot.
    pub fn from_notes(notes: Vec<Note>) -> Self {
        let mut index = Self { notes };
        index.resort();
        index
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.notes.iter().any(|n| n.file_name == file_name)
    }

    pub fn get(&self, file_name: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.file_name == file_name)
    }

    /// Inserts a note, keeping the order invariant.
    ///
    /// Idempotent: if the name is already present the call is a no-op
    /// (existing content and timestamp both kept) and returns `false`. This
    /// is what lets a watch "created" notification race a user-initiated
    /// create without producing a duplicate or clobbering the entry.
    pub fn insert(&mut self, note: Note) -> bool {
        if self.contains(&note.file_name) {
            return false;
        }
        self.notes.push(note);
        self.resort();
        true
    }

    /// Removes a note if present, returning it so the caller can react —
    /// the selection must be cleared when its note is evicted.
    pub fn remove(&mut self, file_name: &str) -> Option<Note> {
        let pos = self.notes.iter().position(|n| n.file_name == file_name)?;
        Some(self.notes.remove(pos))
    }

    /// Rekeys one entry and stamps it with the rename time, then re-sorts.
    ///
    /// Fails with `NoteNotFound` if `old` is absent, and with a `Taken`
    /// name error if `new` already belongs to a different entry — the
    /// no-duplicates invariant holds for every call sequence.
    pub fn rename(&mut self, old: &str, new: &str, ts: DateTime<Utc>) -> Result<()> {
        if old != new && self.contains(new) {
            return Err(NameError::Taken(model::display_name(new).to_string()).into());
        }
        let note = self
            .get_mut(old)
            .ok_or_else(|| NotedeskError::NoteNotFound(old.to_string()))?;
        note.file_name = new.to_string();
        note.last_modified = ts;
        self.resort();
        Ok(())
    }

    /// Replaces content and timestamp of an existing note (the save path).
    /// The resort moves the note to the top of the view.
    pub fn touch(&mut self, file_name: &str, ts: DateTime<Utc>, content: String) -> Result<()> {
        let note = self
            .get_mut(file_name)
            .ok_or_else(|| NotedeskError::NoteNotFound(file_name.to_string()))?;
        note.last_modified = ts;
        note.content = content;
        self.resort();
        Ok(())
    }

    /// The display order: `last_modified` descending, stable for ties.
    pub fn sorted(&self) -> &[Note] {
        &self.notes
    }

    /// Full validation for a proposed display-name stem: legality checks
    /// from [`model::validate_stem`] plus the collision check against this
    /// index. `current` is the file name the note already holds (renames may
    /// keep their own name). Returns the full file name on success.
    pub fn check_stem(
        &self,
        stem: &str,
        current: Option<&str>,
    ) -> std::result::Result<String, NameError> {
        model::validate_stem(stem)?;
        let file_name = model::file_name(stem);
        if self.contains(&file_name) && current != Some(file_name.as_str()) {
            return Err(NameError::Taken(stem.to_string()));
        }
        Ok(file_name)
    }

    fn get_mut(&mut self, file_name: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.file_name == file_name)
    }

    fn resort(&mut self) {
        self.notes.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn note(name: &str, millis: i64) -> Note {
        Note::new(name, at(millis), format!("{} content", name))
    }

    fn names(index: &NoteIndex) -> Vec<&str> {
        index.sorted().iter().map(|n| n.file_name.as_str()).collect()
    }

    // --- Ordering ---

    #[test]
    fn newest_first_and_touch_moves_to_top() {
        let mut index = NoteIndex::from_notes(vec![note("a.txt", 100), note("b.txt", 200)]);
        assert_eq!(names(&index), vec!["b.txt", "a.txt"]);

        index.touch("a.txt", at(300), "updated".to_string()).unwrap();
        assert_eq!(names(&index), vec!["a.txt", "b.txt"]);
        assert_eq!(index.get("a.txt").unwrap().content, "updated");
    }

    #[test]
    fn equal_timestamps_are_stable_across_calls() {
        let index = NoteIndex::from_notes(vec![
            note("c.txt", 500),
            note("a.txt", 500),
            note("b.txt", 500),
        ]);
        let first: Vec<String> = names(&index).iter().map(|s| s.to_string()).collect();
        assert_eq!(first, vec!["a.txt", "b.txt", "c.txt"]);
        assert_eq!(names(&index), first);
    }

    // --- Uniqueness ---

    #[test]
    fn insert_is_idempotent_and_never_overwrites() {
        let mut index = NoteIndex::new();
        assert!(index.insert(note("a.txt", 100)));
        assert!(!index.insert(Note::new("a.txt", at(999), "other content")));

        assert_eq!(index.len(), 1);
        let kept = index.get("a.txt").unwrap();
        assert_eq!(kept.content, "a.txt content");
        assert_eq!(kept.last_modified, at(100));
    }

    #[test]
    fn mixed_mutation_sequences_keep_names_unique() {
        let mut index = NoteIndex::new();
        index.insert(note("a.txt", 100));
        index.insert(note("b.txt", 200));
        index.insert(note("a.txt", 300));
        index.rename("a.txt", "c.txt", at(400)).unwrap();
        index.insert(note("a.txt", 500));
        index.touch("b.txt", at(600), "b2".to_string()).unwrap();
        index.remove("c.txt");
        index.insert(note("c.txt", 700));

        let mut seen: Vec<&str> = names(&index);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), index.len());
    }

    // --- Removal ---

    #[test]
    fn remove_returns_the_evicted_note() {
        let mut index = NoteIndex::from_notes(vec![note("a.txt", 100)]);
        let gone = index.remove("a.txt").unwrap();
        assert_eq!(gone.file_name, "a.txt");
        assert!(index.remove("a.txt").is_none());
        assert!(index.is_empty());
    }

    // --- Rename ---

    #[test]
    fn rename_rekeys_and_restamps() {
        let mut index = NoteIndex::from_notes(vec![note("a.txt", 100), note("b.txt", 200)]);
        index.rename("a.txt", "z.txt", at(300)).unwrap();

        assert!(!index.contains("a.txt"));
        let renamed = index.get("z.txt").unwrap();
        assert_eq!(renamed.last_modified, at(300));
        assert_eq!(renamed.content, "a.txt content");
        assert_eq!(names(&index), vec!["z.txt", "b.txt"]);
    }

    #[test]
    fn rename_of_missing_note_fails() {
        let mut index = NoteIndex::new();
        let err = index.rename("ghost.txt", "new.txt", at(100)).unwrap_err();
        assert!(matches!(err, NotedeskError::NoteNotFound(_)));
    }

    #[test]
    fn rename_onto_existing_name_fails() {
        let mut index = NoteIndex::from_notes(vec![note("a.txt", 100), note("b.txt", 200)]);
        let err = index.rename("a.txt", "b.txt", at(300)).unwrap_err();
        assert!(matches!(
            err,
            NotedeskError::InvalidName(NameError::Taken(_))
        ));
        assert_eq!(index.len(), 2);
    }

    // --- Touch ---

    #[test]
    fn touch_of_missing_note_fails() {
        let mut index = NoteIndex::new();
        let err = index
            .touch("ghost.txt", at(100), String::new())
            .unwrap_err();
        assert!(matches!(err, NotedeskError::NoteNotFound(_)));
    }

    // --- Validation ---

    #[test]
    fn check_stem_rejects_collisions_except_own_name() {
        let index = NoteIndex::from_notes(vec![note("a.txt", 100)]);

        assert_eq!(index.check_stem("a", None), Err(NameError::Taken("a".into())));
        assert_eq!(index.check_stem("a", Some("a.txt")), Ok("a.txt".to_string()));
        assert_eq!(index.check_stem("b", None), Ok("b.txt".to_string()));
        assert_eq!(index.check_stem("", None), Err(NameError::Empty));
        assert_eq!(index.check_stem("a/b", None), Err(NameError::Reserved('/')));
    }
}
