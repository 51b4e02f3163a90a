use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/";
pub const DEFAULT_AUTOSAVE_SECS: u64 = 30;

const BASE_URL_VAR: &str = "HEROTOPIA_BASE_URL";
const DATA_DIR_VAR: &str = "HEROTOPIA_DATA_DIR";
const AUTOSAVE_VAR: &str = "HEROTOPIA_AUTOSAVE_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HEROTOPIA_BASE_URL is not a valid URL ({value}): {source}")]
    BaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("HEROTOPIA_BASE_URL must use http or https, got {0}")]
    Scheme(String),
    #[error("HEROTOPIA_AUTOSAVE_SECS must be a positive number of seconds, got {0:?}")]
    Autosave(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: Url,
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
    pub autosave_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(
            lookup(BASE_URL_VAR)
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL),
        )?;

        let data_dir = lookup(DATA_DIR_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let autosave_interval = match lookup(AUTOSAVE_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::Autosave(raw)),
            },
            None => Duration::from_secs(DEFAULT_AUTOSAVE_SECS),
        };

        let download_dir = directories::UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(PathBuf::from))
            .unwrap_or_else(|| data_dir.join("downloads"));

        Ok(Self {
            base_url,
            data_dir,
            download_dir,
            autosave_interval,
        })
    }
}

/// Parses the backend root, forcing a trailing slash so endpoints join
/// below it instead of replacing its last segment.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|source| ConfigError::BaseUrl {
        value: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Scheme(other.to_string())),
    }
}

fn default_data_dir() -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("org", "Herotopia", "Herotopia") {
        return dirs.data_dir().to_path_buf();
    }
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".herotopia")
}
