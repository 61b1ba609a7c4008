use notedesk::config::AppConfig;
use notedesk::selection::{Intent, Outcome, Selection};
use notedesk::session::Session;
use notedesk::store::fs::FsNoteFiles;
use std::fs;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn setup(notes: &[(&str, &str)]) -> (TempDir, Session<FsNoteFiles>) {
    let dir = TempDir::new().unwrap();
    for (name, content) in notes {
        fs::write(dir.path().join(name), content).unwrap();
        // Distinct mtimes even on coarse-grained filesystems.
        thread::sleep(Duration::from_millis(20));
    }
    let config = AppConfig {
        base_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let mut session = Session::new(FsNoteFiles, config, None);
    session.init().unwrap();
    (dir, session)
}

fn names(session: &Session<FsNoteFiles>) -> Vec<String> {
    session
        .notes()
        .iter()
        .map(|n| n.file_name.clone())
        .collect()
}

#[test]
fn test_session_save_survives_reload() {
    let (dir, mut session) = setup(&[("a.txt", "alpha"), ("b.txt", "beta")]);
    assert_eq!(names(&session), ["b.txt", "a.txt"]);

    session
        .dispatch(Intent::Select {
            file_name: "a.txt".to_string(),
        })
        .unwrap();
    session
        .dispatch(Intent::Edit {
            buffer: "alpha v2".to_string(),
        })
        .unwrap();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(session.dispatch(Intent::Save).unwrap(), Outcome::Updated);

    // The write is on disk, not just in the index.
    let on_disk = fs::read_to_string(dir.path().join("a.txt")).unwrap();
    assert_eq!(on_disk, "alpha v2");

    // A fresh session sees the same content and the same order: the save
    // made a.txt the newest note.
    let config = AppConfig {
        base_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let mut reloaded = Session::new(FsNoteFiles, config, None);
    reloaded.init().unwrap();
    assert_eq!(names(&reloaded), ["a.txt", "b.txt"]);
    assert_eq!(reloaded.notes()[0].content, "alpha v2");
}

#[test]
fn test_session_rename_order_survives_reload() {
    let (dir, mut session) = setup(&[("a.txt", "alpha"), ("b.txt", "beta")]);
    assert_eq!(names(&session), ["b.txt", "a.txt"]);

    thread::sleep(Duration::from_millis(20));
    session
        .dispatch(Intent::Rename {
            file_name: "a.txt".to_string(),
            stem: "z".to_string(),
        })
        .unwrap();
    assert_eq!(names(&session), ["z.txt", "b.txt"]);

    // The rename stamped the file's mtime, so the ordering is not just
    // index state: a fresh listing of the directory agrees.
    let config = AppConfig {
        base_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let mut reloaded = Session::new(FsNoteFiles, config, None);
    reloaded.init().unwrap();
    assert_eq!(names(&reloaded), ["z.txt", "b.txt"]);
    assert_eq!(reloaded.notes()[0].content, "alpha");
}

#[test]
fn test_session_create_writes_an_empty_file() {
    let (dir, mut session) = setup(&[]);
    session
        .dispatch(Intent::Create {
            stem: "fresh".to_string(),
        })
        .unwrap();
    let on_disk = fs::read_to_string(dir.path().join("fresh.txt")).unwrap();
    assert_eq!(on_disk, "");
    assert_eq!(
        *session.selection(),
        Selection::Viewing {
            file_name: "fresh.txt".to_string()
        }
    );
}

#[test]
fn test_session_refresh_picks_up_external_files() {
    let (dir, mut session) = setup(&[("a.txt", "alpha")]);
    fs::write(dir.path().join("external.txt"), "from outside").unwrap();

    assert_eq!(session.dispatch(Intent::Refresh).unwrap(), Outcome::Updated);
    assert!(names(&session).contains(&"external.txt".to_string()));
}

#[test]
fn test_session_vanished_directory_falls_back_to_picker() {
    let (dir, mut session) = setup(&[("a.txt", "alpha")]);
    fs::remove_dir_all(dir.path()).unwrap();

    assert_eq!(
        session.dispatch(Intent::Refresh).unwrap(),
        Outcome::PickDirectory
    );
    assert!(session.base_dir().is_none());
    assert!(session.notes().is_empty());
}

#[test]
fn test_session_last_open_round_trips_through_config() {
    let notes_dir = TempDir::new().unwrap();
    let config_dir = TempDir::new().unwrap();
    fs::write(notes_dir.path().join("a.txt"), "alpha").unwrap();

    let config = AppConfig {
        base_dir: Some(notes_dir.path().to_path_buf()),
        ..Default::default()
    };
    let mut session = Session::new(
        FsNoteFiles,
        config,
        Some(config_dir.path().to_path_buf()),
    );
    session.init().unwrap();
    session
        .dispatch(Intent::Select {
            file_name: "a.txt".to_string(),
        })
        .unwrap();

    // The bookmark reached disk.
    let stored = AppConfig::load(config_dir.path()).unwrap();
    assert_eq!(stored.last_open.as_deref(), Some("a.txt"));

    // A fresh session restores the note, then clears the bookmark so a
    // later crash cannot replay it.
    let mut restored = Session::new(
        FsNoteFiles,
        stored,
        Some(config_dir.path().to_path_buf()),
    );
    restored.init().unwrap();
    assert_eq!(restored.selection().file_name(), Some("a.txt"));
    let after = AppConfig::load(config_dir.path()).unwrap();
    assert_eq!(after.last_open, None);
}
