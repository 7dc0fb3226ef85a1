use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::BaseDirs;
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::utils::normalize_url;

pub const BACKEND_URL_ENV: &str = "COMPANION_BACKEND_URL";
pub const REQUEST_TIMEOUT_ENV: &str = "COMPANION_REQUEST_TIMEOUT_SECS";

const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base for every endpoint: chat, goals and auth.
    pub backend_url: Url,
    /// Upper bound for a single remote call made by a session.
    pub request_timeout: Duration,
    /// Where preferences live; `None` uses the platform config directory.
    pub preferences_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    backend_url: Option<String>,
    request_timeout_secs: Option<u64>,
    preferences_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: Url::parse(DEFAULT_BACKEND_URL).expect("default backend url is valid"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            preferences_path: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("mindful-companion").join("config.toml"))
    }

    /// Defaults, then the config file (if any), then the environment.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let explicit = path.is_some();
        if let Some(path) = path.or_else(Self::default_path) {
            match fs::read_to_string(&path) {
                Ok(text) => {
                    log::debug!("reading config from {}", path.display());
                    config.apply_toml(&text)?;
                }
                // only the default location may be absent
                Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn apply_toml(&mut self, text: &str) -> Result<(), ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        if let Some(url) = file.backend_url {
            self.set_backend_url(&url)?;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.set_timeout_secs(secs)?;
        }
        if file.preferences_path.is_some() {
            self.preferences_path = file.preferences_path;
        }
        Ok(())
    }

    /// Applies `COMPANION_*` variables as returned by `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.set_backend_url(&url)?;
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::Timeout(format!("{raw:?}: {e}")))?;
            self.set_timeout_secs(secs)?;
        }
        Ok(())
    }

    pub fn set_backend_url(&mut self, raw: &str) -> Result<(), ConfigError> {
        let normalized = normalize_url(raw);
        self.backend_url = Url::parse(&normalized).map_err(|source| ConfigError::BackendUrl {
            url: raw.to_owned(),
            source,
        })?;
        Ok(())
    }

    pub fn set_timeout_secs(&mut self, secs: u64) -> Result<(), ConfigError> {
        if secs == 0 {
            return Err(ConfigError::Timeout("must be at least one second".into()));
        }
        self.request_timeout = Duration::from_secs(secs);
        Ok(())
    }
}
