use crate::chat::ChatTurn;
use crate::language::Language;
use crate::theme::ThemePreference;
use tracing::warn;

pub mod store;

pub use store::KeyValueStore;

pub const CHAT_HISTORY_KEY: &str = "herotopia_chat_history";
pub const LANGUAGE_KEY: &str = "herotopia_last_language";
pub const THEME_KEY: &str = "herotopia_theme";

/// Best-effort persistence of client state.
///
/// Reads fall back to `None` on any failure and writes report failures only
/// through the log.
#[derive(Debug, Clone)]
pub struct LocalState {
    store: KeyValueStore,
}

impl LocalState {
    pub fn new(store: KeyValueStore) -> Self {
        Self { store }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "failed to read stored value");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(err) = self.store.set(key, value) {
            warn!(key, error = %err, "failed to store value");
        }
    }

    pub fn load_chat_log(&self) -> Option<Vec<ChatTurn>> {
        let raw = self.read(CHAT_HISTORY_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(turns) => Some(turns),
            Err(err) => {
                warn!(error = %err, "dropping corrupt chat history");
                None
            }
        }
    }

    pub fn save_chat_log(&self, turns: &[ChatTurn]) {
        match serde_json::to_string(turns) {
            Ok(raw) => self.write(CHAT_HISTORY_KEY, &raw),
            Err(err) => warn!(error = %err, "failed to encode chat history"),
        }
    }

    pub fn forget_chat_log(&self) {
        if let Err(err) = self.store.remove(CHAT_HISTORY_KEY) {
            warn!(error = %err, "failed to remove chat history");
        }
    }

    pub fn load_language(&self) -> Option<Language> {
        let raw = self.read(LANGUAGE_KEY)?;
        let language = Language::from_code(&raw);
        if language.is_none() {
            warn!(code = raw.trim(), "ignoring unsupported stored language");
        }
        language
    }

    pub fn save_language(&self, language: Language) {
        self.write(LANGUAGE_KEY, language.code());
    }

    pub fn load_theme(&self) -> Option<ThemePreference> {
        let raw = self.read(THEME_KEY)?;
        ThemePreference::from_code(&raw)
    }

    pub fn save_theme(&self, preference: ThemePreference) {
        self.write(THEME_KEY, preference.code());
    }
}
