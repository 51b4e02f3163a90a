use crate::library::LibraryEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreadcrumbEntry {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Ready,
    Failed(String),
}

/// Cursor over the library tree fetched from `/library`.
///
/// The tree is installed once and never mutated afterwards. The visible
/// slice is always recomputed from the root using the breadcrumb, so no
/// subtree references are kept between calls.
#[derive(Debug, Default)]
pub struct FolderNavigator {
    tree: Vec<LibraryEntry>,
    breadcrumb: Vec<BreadcrumbEntry>,
    load_state: LoadState,
}

impl FolderNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn needs_load(&self) -> bool {
        matches!(self.load_state, LoadState::NotLoaded | LoadState::Failed(_))
    }

    pub fn mark_loading(&mut self) {
        self.load_state = LoadState::Loading;
    }

    pub fn install(&mut self, items: Vec<LibraryEntry>) {
        self.tree = items;
        self.breadcrumb.clear();
        self.load_state = LoadState::Ready;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.tree.clear();
        self.breadcrumb.clear();
        self.load_state = LoadState::Failed(message.into());
    }

    pub fn root(&self) -> &[LibraryEntry] {
        &self.tree
    }

    pub fn breadcrumb(&self) -> &[BreadcrumbEntry] {
        &self.breadcrumb
    }

    pub fn current_view(&self) -> &[LibraryEntry] {
        match self.breadcrumb.last() {
            Some(entry) => resolve(&self.tree, &entry.path),
            None => &self.tree,
        }
    }

    /// Moves the cursor to `path`, walked from the root.
    ///
    /// A segment that matches no folder leaves an empty view, but the
    /// breadcrumb entry is still recorded. An empty path shows the current
    /// view without touching the breadcrumb.
    pub fn descend(&mut self, path: &str) -> &[LibraryEntry] {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return self.current_view();
        }

        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.breadcrumb.push(BreadcrumbEntry {
            name,
            path: path.to_string(),
        });
        self.current_view()
    }

    pub fn ascend(&mut self) -> &[LibraryEntry] {
        self.breadcrumb.pop();
        self.current_view()
    }

    pub fn reset(&mut self) -> &[LibraryEntry] {
        self.breadcrumb.clear();
        self.root()
    }

    /// Keeps the first `index + 1` breadcrumb entries.
    pub fn jump_to(&mut self, index: usize) -> &[LibraryEntry] {
        self.breadcrumb.truncate(index.saturating_add(1));
        self.current_view()
    }

    /// Entries of the current view whose name contains `term`, ignoring case.
    pub fn filter(&self, term: &str) -> Vec<&LibraryEntry> {
        let needle = term.trim().to_lowercase();
        self.current_view()
            .iter()
            .filter(|entry| needle.is_empty() || entry.name.to_lowercase().contains(&needle))
            .collect()
    }
}

fn resolve<'a>(root: &'a [LibraryEntry], path: &str) -> &'a [LibraryEntry] {
    let mut current = root;
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        let folder = current
            .iter()
            .find(|entry| entry.is_folder() && entry.name == segment);
        match folder {
            Some(folder) => current = folder.children(),
            None => return &[],
        }
    }
    current
}
