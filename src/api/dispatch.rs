use crate::api::{ApiClient, ApiError};
use crate::chat::ChatRequest;
use crate::event::{AppEvent, TaskKind};
use reqwest::Url;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs API calls on the tokio runtime and reports each result as one
/// [`AppEvent`].
#[derive(Clone)]
pub struct Backend {
    api: Arc<ApiClient>,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
    download_dir: PathBuf,
}

impl Backend {
    pub fn new(
        api: ApiClient,
        tx: mpsc::Sender<AppEvent>,
        download_dir: PathBuf,
    ) -> Result<Self, tokio::runtime::TryCurrentError> {
        let runtime_handle = Handle::try_current()?;
        Ok(Self {
            api: Arc::new(api),
            tx,
            runtime_handle,
            download_dir,
        })
    }

    pub fn base_url(&self) -> &Url {
        self.api.base_url()
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn file_url(&self, path: &str) -> Result<Url, ApiError> {
        self.api.file_url(path)
    }

    pub fn send_chat(&self, request: ChatRequest) {
        let api = Arc::clone(&self.api);
        self.spawn_reported(TaskKind::Chat, async move {
            AppEvent::ChatReplied(api.chat(&request).await)
        });
    }

    pub fn load_library(&self) {
        let api = Arc::clone(&self.api);
        self.spawn_reported(TaskKind::Library, async move {
            AppEvent::LibraryLoaded(api.library().await)
        });
    }

    pub fn download(&self, path: String, name: String) {
        let api = Arc::clone(&self.api);
        let dir = self.download_dir.clone();
        let task = TaskKind::Download { name: name.clone() };
        self.spawn_reported(task, async move {
            let result = save_file(&api, &path, &dir, &name).await;
            AppEvent::FileSaved { name, result }
        });
    }

    /// Spawns `future` and forwards its event; a panicking task is reported as
    /// [`AppEvent::TaskFailed`] tagged with `task`.
    fn spawn_reported<F>(&self, task: TaskKind, future: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        let handle = self.runtime_handle.spawn(future);
        self.runtime_handle.spawn(async move {
            let event = match handle.await {
                Ok(event) => event,
                Err(err) => {
                    error!(?task, error = %err, "background task failed");
                    AppEvent::TaskFailed {
                        task,
                        reason: err.to_string(),
                    }
                }
            };
            let _ = tx.send(event);
        });
    }
}

async fn save_file(
    api: &ApiClient,
    path: &str,
    dir: &Path,
    name: &str,
) -> Result<PathBuf, DownloadError> {
    let bytes = api.fetch_file(path).await?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| DownloadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let destination = unique_destination(dir, name);
    tokio::fs::write(&destination, &bytes)
        .await
        .map_err(|source| DownloadError::Io {
            path: destination.clone(),
            source,
        })?;
    info!(path = %destination.display(), bytes = bytes.len(), "library file saved");
    Ok(destination)
}

/// `dir/name`, or `dir/stem (n).ext` for the first `n` that is not taken.
pub fn unique_destination(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (name, None),
    };
    let mut counter = 1u32;
    loop {
        let file_name = match extension {
            Some(extension) => format!("{stem} ({counter}).{extension}"),
            None => format!("{stem} ({counter})"),
        };
        let candidate = dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
