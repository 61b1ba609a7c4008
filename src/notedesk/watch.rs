//! Directory watch adapter: turns raw `notify` events for the base
//! directory into the small [`WatchEvent`] vocabulary the session
//! reconciles. Filtering happens here, at the edge — only direct children
//! carrying the note suffix (and the removal of the watched directory
//! itself) survive the mapping.

use crate::error::Result;
use crate::model;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};

/// External filesystem notification, scoped to the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Created { file_name: String },
    Removed { file_name: String },
    /// The watched directory itself is gone.
    DirectoryRemoved,
}

/// Production watch subscription over one base directory.
///
/// Owns a non-recursive `notify` watcher and a channel of mapped
/// [`WatchEvent`]s. The sequence is restartable: to follow a directory
/// change, drop the watcher and spawn a new one on the new path.
pub struct DirWatcher {
    events: Receiver<WatchEvent>,
    // Dropping the watcher ends the subscription.
    _watcher: RecommendedWatcher,
}

impl DirWatcher {
    /// Start watching `dir`.
    pub fn spawn(dir: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let root = dir.to_path_buf();
        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    for mapped in map_event(&root, &event) {
                        let _ = tx.send(mapped);
                    }
                }
            },
            Config::default(),
        )?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(Self {
            events: rx,
            _watcher: watcher,
        })
    }

    /// Drain every event observed since the last call, in arrival order.
    /// Never blocks. The embedder feeds these to `Session::handle_watch`.
    pub fn pending(&self) -> Vec<WatchEvent> {
        self.events.try_iter().collect()
    }
}

/// Maps one raw event onto our vocabulary.
///
/// Platforms disagree on how renames surface: inotify delivers one
/// `Name(Both)` event with `[from, to]`, others deliver separate
/// `Name(From)`/`Name(To)` halves, and some only `Name(Any)` per path — for
/// those the current existence of the path decides the direction. Every
/// rename therefore degrades to a removed/created pair, which is exactly
/// what the session's reconciliation wants.
fn map_event(root: &Path, event: &Event) -> Vec<WatchEvent> {
    let mut mapped = Vec::new();
    match &event.kind {
        EventKind::Create(_) => {
            for path in &event.paths {
                if let Some(file_name) = note_child(root, path) {
                    mapped.push(WatchEvent::Created { file_name });
                }
            }
        }
        EventKind::Remove(_) => {
            for path in &event.paths {
                if path == root {
                    return vec![WatchEvent::DirectoryRemoved];
                }
                if let Some(file_name) = note_child(root, path) {
                    mapped.push(WatchEvent::Removed { file_name });
                }
            }
        }
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => {
                for path in &event.paths {
                    if let Some(file_name) = note_child(root, path) {
                        mapped.push(WatchEvent::Removed { file_name });
                    }
                }
            }
            RenameMode::To => {
                for path in &event.paths {
                    if let Some(file_name) = note_child(root, path) {
                        mapped.push(WatchEvent::Created { file_name });
                    }
                }
            }
            RenameMode::Both => {
                if event.paths.len() >= 2 {
                    if let Some(file_name) = note_child(root, &event.paths[0]) {
                        mapped.push(WatchEvent::Removed { file_name });
                    }
                    if let Some(file_name) = note_child(root, &event.paths[1]) {
                        mapped.push(WatchEvent::Created { file_name });
                    }
                }
            }
            RenameMode::Any | RenameMode::Other => {
                for path in &event.paths {
                    if let Some(file_name) = note_child(root, path) {
                        if path.exists() {
                            mapped.push(WatchEvent::Created { file_name });
                        } else {
                            mapped.push(WatchEvent::Removed { file_name });
                        }
                    }
                }
            }
        },
        // Content modifications are not reconciled: external edits to a
        // note's text are last-write-wins at the next load.
        _ => {}
    }
    mapped
}

/// Direct child of `root` that counts as a note file, as a file name.
fn note_child(root: &Path, path: &Path) -> Option<String> {
    if path.parent() != Some(root) {
        return None;
    }
    let name = path.file_name()?.to_str()?;
    if model::is_note_file(name) {
        Some(name.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use std::path::PathBuf;

    fn root() -> PathBuf {
        PathBuf::from("/notes")
    }

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn create_of_note_child_maps_to_created() {
        let raw = event(EventKind::Create(CreateKind::File), &["/notes/a.txt"]);
        assert_eq!(
            map_event(&root(), &raw),
            vec![WatchEvent::Created {
                file_name: "a.txt".into()
            }]
        );
    }

    #[test]
    fn non_notes_are_filtered_at_the_edge() {
        let wrong_suffix = event(EventKind::Create(CreateKind::File), &["/notes/a.md"]);
        let dotfile = event(EventKind::Create(CreateKind::File), &["/notes/.a.txt"]);
        let nested = event(EventKind::Create(CreateKind::File), &["/notes/sub/a.txt"]);
        let elsewhere = event(EventKind::Create(CreateKind::File), &["/other/a.txt"]);

        assert!(map_event(&root(), &wrong_suffix).is_empty());
        assert!(map_event(&root(), &dotfile).is_empty());
        assert!(map_event(&root(), &nested).is_empty());
        assert!(map_event(&root(), &elsewhere).is_empty());
    }

    #[test]
    fn remove_of_note_child_maps_to_removed() {
        let raw = event(EventKind::Remove(RemoveKind::File), &["/notes/a.txt"]);
        assert_eq!(
            map_event(&root(), &raw),
            vec![WatchEvent::Removed {
                file_name: "a.txt".into()
            }]
        );
    }

    #[test]
    fn removal_of_the_root_wins_regardless_of_kind() {
        let raw = event(
            EventKind::Remove(RemoveKind::Any),
            &["/notes/a.txt", "/notes"],
        );
        assert_eq!(map_event(&root(), &raw), vec![WatchEvent::DirectoryRemoved]);
    }

    #[test]
    fn rename_both_becomes_removed_then_created() {
        let raw = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/notes/old.txt", "/notes/new.txt"],
        );
        assert_eq!(
            map_event(&root(), &raw),
            vec![
                WatchEvent::Removed {
                    file_name: "old.txt".into()
                },
                WatchEvent::Created {
                    file_name: "new.txt".into()
                },
            ]
        );
    }

    #[test]
    fn rename_halves_map_by_direction() {
        let from = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/notes/old.txt"],
        );
        let to = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/notes/new.txt"],
        );
        assert_eq!(
            map_event(&root(), &from),
            vec![WatchEvent::Removed {
                file_name: "old.txt".into()
            }]
        );
        assert_eq!(
            map_event(&root(), &to),
            vec![WatchEvent::Created {
                file_name: "new.txt".into()
            }]
        );
    }

    #[test]
    fn ambiguous_rename_probes_existence() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().to_path_buf();

        let present = root.join("here.txt");
        std::fs::write(&present, "x").unwrap();
        let absent = root.join("gone.txt");

        let raw = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any)))
            .add_path(present)
            .add_path(absent);
        assert_eq!(
            map_event(&root, &raw),
            vec![
                WatchEvent::Created {
                    file_name: "here.txt".into()
                },
                WatchEvent::Removed {
                    file_name: "gone.txt".into()
                },
            ]
        );
    }

    #[test]
    fn content_modifications_are_ignored() {
        let raw = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/notes/a.txt"],
        );
        assert!(map_event(&root(), &raw).is_empty());
    }
}
