use crate::api::dispatch::DownloadError;
use crate::api::ApiError;
use crate::library::LibraryEntry;
use std::path::PathBuf;

/// Which background job a [`AppEvent::TaskFailed`] belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    Chat,
    Library,
    Download { name: String },
}

/// Results posted from runtime tasks back to the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    ChatReplied(Result<String, ApiError>),
    LibraryLoaded(Result<Vec<LibraryEntry>, ApiError>),
    FileSaved {
        name: String,
        result: Result<PathBuf, DownloadError>,
    },
    /// The task panicked before it could post its own result.
    TaskFailed { task: TaskKind, reason: String },
}
