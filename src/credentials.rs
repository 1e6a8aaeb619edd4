//! API key storage.
//!
//! The key is kept in `~/.ducky/config.json` under the `api_key` field. Other
//! fields in that file are left untouched on write. A missing or unreadable
//! file is treated as "no key", which sends the user through setup instead of
//! failing.

use crate::config::ConfigError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable that overrides the stored key.
pub const API_KEY_ENV: &str = "DUCKY_API_KEY";

const API_KEY_FIELD: &str = "api_key";

/// JSON-file backed API key store.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at the default location, `~/.ducky/config.json`.
    pub fn open_default() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoDirectory("home"))?;
        Ok(Self::at(home.join(".ducky").join("config.json")))
    }

    /// Store backed by an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored key, if any.
    pub fn get_api_key(&self) -> Option<String> {
        self.load()
            .get(API_KEY_FIELD)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    /// The key from `DUCKY_API_KEY` if set, otherwise the stored one.
    pub fn resolve_api_key(&self) -> Option<String> {
        prefer_env_key(std::env::var(API_KEY_ENV).ok(), || self.get_api_key())
    }

    /// Persist `key`, keeping any other fields already in the file.
    pub fn set_api_key(&self, key: &str) -> Result<(), ConfigError> {
        let mut fields = self.load();
        fields.insert(API_KEY_FIELD.to_string(), Value::String(key.to_string()));

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(&Value::Object(fields))?;
        std::fs::write(&self.path, contents).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        restrict_permissions(&self.path)?;

        debug!(path = %self.path.display(), "saved api key");
        Ok(())
    }

    fn load(&self) -> Map<String, Value> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return Map::new(),
        };
        match serde_json::from_str(&contents) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "ignoring unreadable credentials file");
                Map::new()
            }
        }
    }
}

fn prefer_env_key(from_env: Option<String>, stored: impl FnOnce() -> Option<String>) -> Option<String> {
    from_env
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .or_else(stored)
}

/// The file holds a secret; keep it owner-only.
fn restrict_permissions(path: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|source| {
            ConfigError::Write {
                path: path.to_path_buf(),
                source,
            }
        })?;
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, CredentialStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join(".ducky").join("config.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_has_no_key() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get_api_key(), None);
    }

    #[test]
    fn test_set_then_get() {
        let (_dir, store) = temp_store();
        store.set_api_key("sk-test-1234567890").unwrap();
        assert_eq!(store.get_api_key().as_deref(), Some("sk-test-1234567890"));

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["api_key"], "sk-test-1234567890");
    }

    #[test]
    fn test_set_preserves_other_fields() {
        let (_dir, store) = temp_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"api_key": "old", "nickname": "quack"}"#).unwrap();

        store.set_api_key("new-key-0123456789").unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["api_key"], "new-key-0123456789");
        assert_eq!(raw["nickname"], "quack");
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let (_dir, store) = temp_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.get_api_key(), None);

        store.set_api_key("recovered-key-000").unwrap();
        assert_eq!(store.get_api_key().as_deref(), Some("recovered-key-000"));
    }

    #[test]
    fn test_non_string_key_is_ignored() {
        let (_dir, store) = temp_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"api_key": 42}"#).unwrap();
        assert_eq!(store.get_api_key(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = temp_store();
        store.set_api_key("secret-key-000000").unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_env_key_wins() {
        let key = prefer_env_key(Some("env-key".to_string()), || Some("stored".to_string()));
        assert_eq!(key.as_deref(), Some("env-key"));
    }

    #[test]
    fn test_blank_env_key_falls_back() {
        let key = prefer_env_key(Some("  ".to_string()), || Some("stored".to_string()));
        assert_eq!(key.as_deref(), Some("stored"));
        assert_eq!(prefer_env_key(None, || None), None);
    }
}
