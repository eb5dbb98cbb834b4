//! App catalogue entities and validation.
//!
//! The catalogue is an ordered list of link entries curated by
//! administrators. Each entry carries an immutable opaque id assigned at
//! creation so user preferences can reference entries across reorders and
//! deletions.

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Icon used when an entry does not specify one.
pub const DEFAULT_ICON: &str = "link";

/// URL schemes accepted for catalogue entries.
const ACCEPTED_SCHEMES: [&str; 2] = ["http://", "https://"];

/// A single launcher entry.
///
/// ## Invariants
/// - `name` and `url` are non-empty.
/// - `url` starts with `http://` or `https://`.
/// - `id` never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub description: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

fn default_icon() -> String {
    DEFAULT_ICON.to_owned()
}

/// Validation failures for a single catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum EntryValidationError {
    #[error("entry name must not be empty")]
    EmptyName,
    #[error("entry url must not be empty")]
    EmptyUrl,
    #[error("entry url '{0}' must start with http:// or https://")]
    InvalidScheme(String),
}

impl AppEntry {
    /// Construct a new entry with a freshly assigned id.
    ///
    /// # Errors
    /// Returns a validation error when the name or url are unacceptable.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
        icon: Option<String>,
    ) -> Result<Self, EntryValidationError> {
        let entry = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            url: url.into(),
            description: description.into(),
            icon: icon
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(default_icon),
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Check the entry against the schema invariants.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.name.trim().is_empty() {
            return Err(EntryValidationError::EmptyName);
        }
        if self.url.trim().is_empty() {
            return Err(EntryValidationError::EmptyUrl);
        }
        if !ACCEPTED_SCHEMES
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
        {
            return Err(EntryValidationError::InvalidScheme(self.url.clone()));
        }
        Ok(())
    }
}

/// The ordered, admin-curated catalogue of launcher entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCatalogue {
    pub apps: Vec<AppEntry>,
}

impl AppCatalogue {
    /// Validate every entry in order.
    ///
    /// # Errors
    /// Returns the offending position and its validation error.
    pub fn validate(&self) -> Result<(), (usize, EntryValidationError)> {
        for (position, entry) in self.apps.iter().enumerate() {
            entry.validate().map_err(|error| (position, error))?;
        }
        Ok(())
    }

    /// Reorder entries according to `order`, which must be a complete
    /// permutation of `0..len`. Rejected wholesale otherwise: no partial
    /// reorder is ever applied.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn reorder(&mut self, order: &[usize]) -> Result<(), String> {
        if order.len() != self.apps.len() {
            return Err(format!(
                "order has {} entries but the catalogue has {}",
                order.len(),
                self.apps.len()
            ));
        }
        let mut seen = vec![false; self.apps.len()];
        for &index in order {
            if index >= self.apps.len() {
                return Err(format!("index {index} is out of range"));
            }
            if seen[index] {
                return Err(format!("index {index} appears more than once"));
            }
            seen[index] = true;
        }
        self.apps = order
            .iter()
            .map(|&index| self.apps[index].clone())
            .collect();
        Ok(())
    }

    /// Look up an entry by its stable id.
    pub fn contains(&self, id: Uuid) -> bool {
        self.apps.iter().any(|entry| entry.id == id)
    }
}

/// Built-in catalogue used when the persisted document is absent, corrupt,
/// or empty after filtering. Ids are derived from the entry url (UUIDv5) so
/// the defaults keep stable identities across restarts even before the
/// first save.
pub fn default_catalogue() -> AppCatalogue {
    let entry = |name: &str, url: &str, description: &str, icon: &str| AppEntry {
        id: Uuid::new_v5(&Uuid::NAMESPACE_URL, url.as_bytes()),
        name: name.to_owned(),
        url: url.to_owned(),
        description: description.to_owned(),
        icon: icon.to_owned(),
    };
    AppCatalogue {
        apps: vec![
            entry("Gmail", "https://gmail.com", "Google Mail", "mail"),
            entry(
                "Harvest",
                "https://lynxx.harvestapp.com",
                "Time tracking",
                "clock",
            ),
            entry(
                "Confluence",
                "https://lynxx.atlassian.net/wiki/home",
                "Knowledge base",
                "book",
            ),
        ],
    }
}
