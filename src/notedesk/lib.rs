//! # Notedesk Architecture
//!
//! Notedesk is a **UI-agnostic editor core** for a flat directory of plain-text
//! notes. This is not a desktop app that happens to have some library code—it's
//! a library that a desktop shell (or any other UI) renders and drives.
//!
//! The UI owns pixels and dialogs; this crate owns state and the directory.
//!
//! ## The Shape of the Core
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  UI Shell (not in this crate)                               │
//! │  - Renders from the session's read accessors                │
//! │  - Turns clicks and keystrokes into Intents                 │
//! │  - Shows the dialogs Outcome::Confirm asks for              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Session Layer (session.rs)                                 │
//! │  - dispatch(Intent) / resolve(ConfirmResponse)              │
//! │  - handle_watch(WatchEvent) reconciliation                  │
//! │  - Owns index, selection, query, the one pending action     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  State Layer (index.rs, selection.rs, search.rs)            │
//! │  - Pure data and ordering rules, no I/O                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  File Layer (store/, watch.rs)                              │
//! │  - Abstract NoteFiles trait                                 │
//! │  - FsNoteFiles (production), MemNoteFiles (testing)         │
//! │  - DirWatcher turning notify events into WatchEvents        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: The Directory Is the Database
//!
//! There is no sidecar index, no metadata file, no cache to invalidate. A
//! note is a `.txt` file; its identity is its file name and its sort key is
//! its mtime. Anything else touching the directory—another editor, a sync
//! client, `rm`—is a legitimate writer, and the session reconciles rather
//! than fights: watch events fold external changes into the index, and the
//! only state that can ever be lost is the one unsaved buffer, which is
//! exactly what the confirmation guard exists to protect.
//!
//! ## Key Principle: One Action In Flight
//!
//! The session never has more than one confirmation outstanding. While one
//! is up, new intents are rejected and watch events queue; resolution
//! applies the queue first and then resumes the parked action against the
//! refreshed index. External deletes therefore win races against dialogs.
//!
//! ## Testing Strategy
//!
//! 1. **State** (`index.rs`, `selection.rs`, `search.rs`): unit tests on
//!    pure data. Ordering, dirtiness, filtering.
//!
//! 2. **Session** (`session.rs`): the lion's share. Every flow runs over
//!    `MemNoteFiles`, including the race windows a dialog opens.
//!
//! 3. **Files** (`store/fs.rs`, `watch.rs`): integration tests under
//!    `tests/` against real temp directories cover what memory cannot:
//!    atomic writes, mtimes across rename, watcher event mapping.
//!
//! ## Module Overview
//!
//! - [`session`]: The state machine—entry point for all operations
//! - [`selection`]: The intent/outcome/confirmation vocabulary
//! - [`index`]: The ordered in-memory note list
//! - [`search`]: Substring filtering over the index
//! - [`store`]: File access abstraction and implementations
//! - [`watch`]: Filesystem watcher and event normalization
//! - [`model`]: Core data types (`Note`, naming rules)
//! - [`config`]: Persisted app configuration
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod index;
pub mod model;
pub mod search;
pub mod selection;
pub mod session;
pub mod store;
pub mod watch;
