use crate::model::NameError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotedeskError {
    #[error("Notes directory unavailable: {}", .0.display())]
    DirectoryUnavailable(PathBuf),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Invalid note name: {0}")]
    InvalidName(#[from] NameError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, NotedeskError>;
