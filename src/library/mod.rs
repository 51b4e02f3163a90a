use serde::{Deserialize, Serialize};

pub mod navigator;

const DEFAULT_FILE_ICON: &str = "📦";
const DEFAULT_FILE_CATEGORY: &str = "Other";

/// One file or folder of the remote library, as served by `GET /library`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub kind: EntryKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    Folder {
        #[serde(default)]
        children: Vec<LibraryEntry>,
    },
    File {
        #[serde(default)]
        size: u64,
        #[serde(default)]
        size_human: Option<String>,
        #[serde(default = "default_category")]
        category: String,
        #[serde(default = "default_icon")]
        icon: String,
    },
}

fn default_category() -> String {
    DEFAULT_FILE_CATEGORY.to_string()
}

fn default_icon() -> String {
    DEFAULT_FILE_ICON.to_string()
}

impl LibraryEntry {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, EntryKind::Folder { .. })
    }

    pub fn children(&self) -> &[LibraryEntry] {
        match &self.kind {
            EntryKind::Folder { children } => children,
            EntryKind::File { .. } => &[],
        }
    }

    /// Lower-cased text after the last dot, or the whole name when there is none.
    pub fn extension(&self) -> String {
        self.name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

/// How a file should be handed to the user once clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    OpenInViewer,
    PreviewImage,
    PlayVideo,
    Download,
}

impl FileAction {
    pub fn for_entry(entry: &LibraryEntry) -> Self {
        match entry.extension().as_str() {
            "pdf" | "txt" => Self::OpenInViewer,
            "jpg" | "jpeg" | "png" | "gif" | "svg" => Self::PreviewImage,
            "mp4" | "webm" | "avi" | "mkv" => Self::PlayVideo,
            _ => Self::Download,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OpenInViewer => "open",
            Self::PreviewImage => "image preview",
            Self::PlayVideo => "video player",
            Self::Download => "download",
        }
    }
}
