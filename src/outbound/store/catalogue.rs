//! File-backed catalogue repository.
//!
//! This adapter owns document-shape tolerance: entries are deserialised
//! individually so one malformed entry is dropped (and logged) instead of
//! discarding the whole file, and legacy entries without an id are assigned
//! one on load.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::replace_file;
use crate::domain::app::{AppCatalogue, AppEntry, DEFAULT_ICON, default_catalogue};
use crate::domain::ports::{CatalogueStore, StoreError};

/// Catalogue repository backed by a single JSON file.
pub struct JsonCatalogueStore {
    path: PathBuf,
}

/// Lenient per-entry document shape used only on the read path.
#[derive(Deserialize)]
struct EntryDoc {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: Option<String>,
}

impl JsonCatalogueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(&self, bytes: &[u8]) -> Option<Vec<AppEntry>> {
        let document: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "catalogue file is not valid JSON");
                return None;
            }
        };
        let Some(apps) = document.get("apps").and_then(Value::as_array) else {
            warn!(
                path = %self.path.display(),
                "catalogue document has no 'apps' array"
            );
            return None;
        };

        let mut entries = Vec::with_capacity(apps.len());
        for raw in apps {
            match serde_json::from_value::<EntryDoc>(raw.clone()) {
                Ok(doc) => match materialise(doc) {
                    Ok(entry) => entries.push(entry),
                    Err(reason) => {
                        warn!(%reason, "dropping invalid catalogue entry");
                    }
                },
                Err(error) => {
                    warn!(%error, "dropping unreadable catalogue entry");
                }
            }
        }
        Some(entries)
    }
}

fn materialise(doc: EntryDoc) -> Result<AppEntry, String> {
    let entry = AppEntry {
        id: doc.id.unwrap_or_else(|| {
            let id = Uuid::new_v4();
            info!(%id, name = %doc.name, "assigning id to legacy catalogue entry");
            id
        }),
        name: doc.name,
        url: doc.url,
        description: doc.description,
        icon: doc
            .icon
            .filter(|icon| !icon.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ICON.to_owned()),
    };
    entry.validate().map_err(|error| error.to_string())?;
    Ok(entry)
}

#[async_trait]
impl CatalogueStore for JsonCatalogueStore {
    async fn load(&self) -> AppCatalogue {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    %error,
                    "catalogue file unreadable; using the default catalogue"
                );
                return default_catalogue();
            }
        };
        match self.parse(&bytes) {
            Some(apps) if !apps.is_empty() => AppCatalogue { apps },
            _ => {
                warn!(
                    path = %self.path.display(),
                    "no valid catalogue entries; using the default catalogue"
                );
                default_catalogue()
            }
        }
    }

    async fn save(&self, catalogue: &AppCatalogue) -> Result<(), StoreError> {
        catalogue
            .validate()
            .map_err(|(position, error)| StoreError::InvalidCatalogue {
                position,
                reason: error.to_string(),
            })?;
        let mut bytes = serde_json::to_vec_pretty(catalogue)?;
        bytes.push(b'\n');
        replace_file(&self.path, &bytes)
    }
}
