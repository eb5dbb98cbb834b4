//! Per-user preference repository: one JSON document per user id.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use super::replace_file;
use crate::domain::ports::{PreferenceStore, StoreError};
use crate::domain::preferences::UserPreferences;

/// Preference repository backed by a directory of `<user_id>.json` files.
pub struct JsonPreferenceStore {
    dir: PathBuf,
}

impl JsonPreferenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File names come from the provider subject; anything outside the
    /// expected character set is refused so a hostile id cannot escape the
    /// preferences directory.
    fn file_for(&self, user_id: &str) -> Option<PathBuf> {
        let acceptable = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !acceptable {
            warn!(user_id, "refusing suspicious preference file name");
            return None;
        }
        Some(self.dir.join(format!("{user_id}.json")))
    }
}

#[async_trait]
impl PreferenceStore for JsonPreferenceStore {
    async fn get(&self, user_id: &str) -> UserPreferences {
        let Some(path) = self.file_for(user_id) else {
            return UserPreferences::default();
        };
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => return UserPreferences::default(),
        };
        match serde_json::from_slice(&bytes) {
            Ok(preferences) => preferences,
            Err(error) => {
                warn!(
                    path = %path.display(),
                    %error,
                    "preference document unreadable; using defaults"
                );
                UserPreferences::default()
            }
        }
    }

    async fn set(&self, user_id: &str, preferences: &UserPreferences) -> Result<(), StoreError> {
        let path = self.file_for(user_id).ok_or_else(|| StoreError::Io {
            path: self.dir.display().to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "unacceptable user id for a preference file",
            ),
        })?;
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;
        let mut bytes = serde_json::to_vec_pretty(preferences)?;
        bytes.push(b'\n');
        replace_file(&path, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn store(dir: &TempDir) -> JsonPreferenceStore {
        JsonPreferenceStore::new(dir.path().join("prefs"))
    }

    #[rstest]
    #[actix_rt::test]
    async fn missing_document_yields_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let preferences = store(&dir).get("110248495921238986420").await;
        assert_eq!(preferences, UserPreferences::default());
        assert_eq!(preferences.theme, "default");
    }

    #[rstest]
    #[actix_rt::test]
    async fn set_then_get_round_trips() {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);
        let mut preferences = UserPreferences::default();
        preferences.favorites.insert(Uuid::new_v4());
        preferences.order = vec![Uuid::new_v4(), Uuid::new_v4()];
        preferences.theme = "dark".into();

        store.set("user-1", &preferences).await.expect("persist");
        assert_eq!(store.get("user-1").await, preferences);
    }

    #[rstest]
    #[actix_rt::test]
    async fn corrupt_document_degrades_to_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);
        std::fs::create_dir_all(dir.path().join("prefs")).expect("mkdir");
        std::fs::write(dir.path().join("prefs").join("user-1.json"), b"{broken")
            .expect("write fixture");

        assert_eq!(store.get("user-1").await, UserPreferences::default());
    }

    #[rstest]
    #[case("../escape")]
    #[case("")]
    #[case("a/b")]
    #[actix_rt::test]
    async fn suspicious_user_ids_are_refused(#[case] user_id: &str) {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);

        assert_eq!(store.get(user_id).await, UserPreferences::default());
        store
            .set(user_id, &UserPreferences::default())
            .await
            .expect_err("refused write");
    }
}
