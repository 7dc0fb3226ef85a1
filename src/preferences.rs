//! Local preference storage: the dark-mode flag and the login credentials.
//!
//! The file-backed store keeps one small TOML document in the user's config directory and
//! writes it through on every change, so a value set by one screen is visible to the next one
//! even across restarts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use toml::Value;

use crate::error::StoreError;

pub mod keys {
    pub const DARK_MODE: &str = "darkMode";
    pub const TOKEN: &str = "token";
    pub const USER_ID: &str = "userId";
    pub const USERNAME: &str = "username";
}

pub trait PreferenceStore: Send + Sync {
    /// Unset flags read as `false`.
    fn get_flag(&self, name: &str) -> bool;

    fn set_flag(&self, name: &str, value: bool) -> Result<(), StoreError>;

    /// `None` means the value was never written, which is not the same as an empty string.
    fn get_string(&self, name: &str) -> Option<String>;

    fn set_string(&self, name: &str, value: &str) -> Result<(), StoreError>;

    /// Forgets a string value. Removing an absent key is not an error.
    fn remove(&self, name: &str) -> Result<(), StoreError>;
}

/// Values stay raw TOML; an entry of the wrong type reads as unset.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
struct StoredPreferences {
    #[serde(default)]
    flags: BTreeMap<String, Value>,
    #[serde(default)]
    strings: BTreeMap<String, Value>,
}

impl StoredPreferences {
    /// Only a stored `true` counts.
    fn flag(&self, name: &str) -> bool {
        matches!(self.flags.get(name), Some(Value::Boolean(true)))
    }

    fn string(&self, name: &str) -> Option<String> {
        match self.strings.get(name) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn set_flag(&mut self, name: &str, value: bool) {
        self.flags.insert(name.to_owned(), Value::Boolean(value));
    }

    fn set_string(&mut self, name: &str, value: &str) {
        self.strings
            .insert(name.to_owned(), Value::String(value.to_owned()));
    }
}

/// Preferences held only for the lifetime of the process.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    inner: RwLock<StoredPreferences>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_flag(&self, name: &str) -> bool {
        self.inner.read().flag(name)
    }

    fn set_flag(&self, name: &str, value: bool) -> Result<(), StoreError> {
        self.inner.write().set_flag(name, value);
        Ok(())
    }

    fn get_string(&self, name: &str) -> Option<String> {
        self.inner.read().string(name)
    }

    fn set_string(&self, name: &str, value: &str) -> Result<(), StoreError> {
        self.inner.write().set_string(name, value);
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.inner.write().strings.remove(name);
        Ok(())
    }
}

pub struct FilePreferenceStore {
    path: PathBuf,
    inner: RwLock<StoredPreferences>,
}

impl FilePreferenceStore {
    pub fn default_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("mindful-companion").join("preferences.toml"))
    }

    /// Opens the store at the platform config location.
    pub fn open_default() -> Result<Self, StoreError> {
        let path = Self::default_path().ok_or(StoreError::NoConfigDir)?;
        Self::open(path)
    }

    /// Reads the document at `path`; a missing file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let stored = match fs::read_to_string(&path) {
            Ok(text) => toml::from_str::<StoredPreferences>(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredPreferences::default(),
            Err(e) => return Err(e.into()),
        };
        log::debug!("preferences loaded from {}", path.display());
        Ok(Self {
            path,
            inner: RwLock::new(stored),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, stored: &StoredPreferences) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(stored)?;
        fs::write(&self.path, text)?;
        Ok(())
    }

    /// Applies `change` and persists the result while still holding the write lock, so two
    /// writers cannot interleave their file contents.
    fn update(&self, change: impl FnOnce(&mut StoredPreferences)) -> Result<(), StoreError> {
        let mut guard = self.inner.write();
        let mut next = guard.clone();
        change(&mut next);
        if next == *guard {
            return Ok(());
        }
        self.save(&next)?;
        *guard = next;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get_flag(&self, name: &str) -> bool {
        self.inner.read().flag(name)
    }

    fn set_flag(&self, name: &str, value: bool) -> Result<(), StoreError> {
        self.update(|p| p.set_flag(name, value))
    }

    fn get_string(&self, name: &str) -> Option<String> {
        self.inner.read().string(name)
    }

    fn set_string(&self, name: &str, value: &str) -> Result<(), StoreError> {
        self.update(|p| p.set_string(name, value))
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.update(|p| {
            p.strings.remove(name);
        })
    }
}

/// The signed-in user as remembered by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user_id: Option<String>,
    pub username: String,
}

impl Credentials {
    /// `None` unless both a token and a username were stored.
    pub fn read(store: &dyn PreferenceStore) -> Option<Self> {
        let token = store.get_string(keys::TOKEN)?;
        let username = store.get_string(keys::USERNAME)?;
        Some(Self {
            token,
            user_id: store.get_string(keys::USER_ID),
            username,
        })
    }

    pub fn write(&self, store: &dyn PreferenceStore) -> Result<(), StoreError> {
        store.set_string(keys::TOKEN, &self.token)?;
        store.set_string(keys::USERNAME, &self.username)?;
        match &self.user_id {
            Some(id) => store.set_string(keys::USER_ID, id),
            None => store.remove(keys::USER_ID),
        }
    }

    pub fn clear(store: &dyn PreferenceStore) -> Result<(), StoreError> {
        store.remove(keys::TOKEN)?;
        store.remove(keys::USER_ID)?;
        store.remove(keys::USERNAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_credentials() -> Credentials {
        Credentials {
            token: "tok".into(),
            user_id: Some("u1".into()),
            username: "sam".into(),
        }
    }

    #[test]
    fn unset_flag_is_false() {
        let store = MemoryPreferenceStore::new();
        assert!(!store.get_flag(keys::DARK_MODE));
        store.set_flag(keys::DARK_MODE, true).unwrap();
        assert!(store.get_flag(keys::DARK_MODE));
    }

    #[test]
    fn absent_and_empty_strings_differ() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(store.get_string(keys::TOKEN), None);
        store.set_string(keys::TOKEN, "").unwrap();
        assert_eq!(store.get_string(keys::TOKEN), Some(String::new()));
    }

    #[test]
    fn credentials_need_token_and_username() {
        let store = MemoryPreferenceStore::new();
        store.set_string(keys::USERNAME, "sam").unwrap();
        assert_eq!(Credentials::read(&store), None);

        store.set_string(keys::TOKEN, "tok").unwrap();
        let creds = Credentials::read(&store).unwrap();
        assert_eq!(creds.username, "sam");
        assert_eq!(creds.user_id, None);
    }

    #[test]
    fn credentials_clear_removes_everything() {
        let store = MemoryPreferenceStore::new();
        sample_credentials().write(&store).unwrap();
        assert_eq!(Credentials::read(&store), Some(sample_credentials()));

        Credentials::clear(&store).unwrap();
        assert_eq!(Credentials::read(&store), None);
        assert_eq!(store.get_string(keys::USER_ID), None);
    }

    #[test]
    fn file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.toml");

        let store = FilePreferenceStore::open(&path).unwrap();
        store.set_flag(keys::DARK_MODE, true).unwrap();
        sample_credentials().write(&store).unwrap();
        drop(store);

        let reopened = FilePreferenceStore::open(&path).unwrap();
        assert!(reopened.get_flag(keys::DARK_MODE));
        assert_eq!(Credentials::read(&reopened), Some(sample_credentials()));
    }

    #[test]
    fn mistyped_entries_read_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        fs::write(&path, "[flags]\ndarkMode = \"true\"\n\n[strings]\ntoken = 42\n").unwrap();

        let store = FilePreferenceStore::open(&path).unwrap();
        assert!(!store.get_flag(keys::DARK_MODE));
        assert_eq!(store.get_string(keys::TOKEN), None);

        store.set_flag(keys::DARK_MODE, true).unwrap();
        assert!(FilePreferenceStore::open(&path).unwrap().get_flag(keys::DARK_MODE));
    }

    #[test]
    fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        fs::write(&path, "flags = [not toml").unwrap();
        assert!(matches!(
            FilePreferenceStore::open(&path),
            Err(StoreError::Parse(_))
        ));
    }
}
