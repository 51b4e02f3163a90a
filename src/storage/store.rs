use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// String key-value store backed by one file per key.
#[derive(Debug, Clone)]
pub struct KeyValueStore {
    root: PathBuf,
}

impl KeyValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }

    pub fn ensure_root(&self) -> io::Result<&Path> {
        fs::create_dir_all(&self.root)?;
        Ok(&self.root)
    }

    /// `Ok(None)` when the key was never written.
    pub fn get(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.value_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let dir = self.ensure_root()?;
        let final_path = self.value_path(key);
        let tmp_path = dir.join(format!("{}.json.tmp", sanitize_key(key)));

        fs::write(&tmp_path, value.as_bytes())?;
        match fs::rename(&tmp_path, &final_path) {
            Ok(()) => {}
            Err(rename_err) => {
                if final_path.exists() {
                    fs::remove_file(&final_path)?;
                    fs::rename(&tmp_path, &final_path)?;
                } else {
                    return Err(rename_err);
                }
            }
        }
        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    pub fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::KeyValueStore;
    use std::fs;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = KeyValueStore::new(dir.path().join("state"));
        assert_eq!(store.get("herotopia_theme").expect("read should succeed"), None);
    }

    #[test]
    fn set_then_get_returns_value_and_overwrites() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = KeyValueStore::new(dir.path());

        store.set("herotopia_theme", "dark").expect("first write should succeed");
        store.set("herotopia_theme", "light").expect("overwrite should succeed");

        assert_eq!(
            store.get("herotopia_theme").expect("read should succeed").as_deref(),
            Some("light")
        );
        assert!(!dir.path().join("herotopia_theme.json.tmp").exists());
    }

    #[test]
    fn keys_cannot_escape_root() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = KeyValueStore::new(dir.path());
        store.set("../outside", "x").expect("write should succeed");

        let written: Vec<_> = fs::read_dir(dir.path())
            .expect("root should be readable")
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(written, vec!["___outside.json".to_string()]);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = KeyValueStore::new(dir.path());
        store.set("k", "v").expect("write should succeed");
        store.remove("k").expect("remove should succeed");
        store.remove("k").expect("second remove should succeed");
        assert_eq!(store.get("k").expect("read should succeed"), None);
    }
}
