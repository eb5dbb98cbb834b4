//! Per-user preference overlay and the merge that produces the rendered
//! app list.
//!
//! Preferences reference catalogue entries by their stable ids, so admin
//! edits to the shared list never corrupt a user's favourites: ids that no
//! longer resolve are simply skipped at merge time.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::app::AppEntry;

/// One user's stored preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub favorites: BTreeSet<Uuid>,
    #[serde(default)]
    pub order: Vec<Uuid>,
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_theme() -> String {
    "default".to_owned()
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            favorites: BTreeSet::new(),
            order: Vec::new(),
            theme: default_theme(),
        }
    }
}

/// A catalogue entry annotated for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppView {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub description: String,
    pub icon: String,
    pub is_favorite: bool,
}

impl AppView {
    fn annotate(entry: &AppEntry, favorites: &BTreeSet<Uuid>) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            url: entry.url.clone(),
            description: entry.description.clone(),
            icon: entry.icon.clone(),
            is_favorite: favorites.contains(&entry.id),
        }
    }
}

impl UserPreferences {
    /// Toggle an app in the favourites set (symmetric difference).
    pub fn toggle_favorite(&mut self, id: Uuid) {
        if !self.favorites.remove(&id) {
            self.favorites.insert(id);
        }
    }

    /// Produce this user's view of the catalogue.
    ///
    /// Pure with respect to the shared list: the input is only read. Each
    /// entry is annotated with `is_favorite`; when a stored order exists,
    /// entries are emitted in that sequence (ids that no longer resolve are
    /// skipped) followed by any entry absent from the order, in original
    /// relative order. An empty order preserves catalogue order.
    pub fn apply(&self, apps: &[AppEntry]) -> Vec<AppView> {
        if self.order.is_empty() {
            return apps
                .iter()
                .map(|entry| AppView::annotate(entry, &self.favorites))
                .collect();
        }

        let ordered_ids: BTreeSet<Uuid> = self.order.iter().copied().collect();
        let mut views = Vec::with_capacity(apps.len());
        for id in &self.order {
            if let Some(entry) = apps.iter().find(|entry| entry.id == *id) {
                views.push(AppView::annotate(entry, &self.favorites));
            }
        }
        for entry in apps {
            if !ordered_ids.contains(&entry.id) {
                views.push(AppView::annotate(entry, &self.favorites));
            }
        }
        views
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn entry(name: &str) -> AppEntry {
        AppEntry::new(name, format!("https://{name}.example.com"), "", None).expect("valid entry")
    }

    fn names(views: &[AppView]) -> Vec<&str> {
        views.iter().map(|view| view.name.as_str()).collect()
    }

    #[rstest]
    fn empty_order_annotates_without_reordering() {
        let apps = [entry("a"), entry("b"), entry("c")];
        let mut prefs = UserPreferences::default();
        prefs.favorites.insert(apps[1].id);

        let views = prefs.apply(&apps);
        assert_eq!(names(&views), ["a", "b", "c"]);
        assert_eq!(
            views.iter().map(|v| v.is_favorite).collect::<Vec<_>>(),
            [false, true, false]
        );
    }

    #[rstest]
    fn stored_order_reorders_the_list() {
        let apps = [entry("a"), entry("b"), entry("c")];
        let prefs = UserPreferences {
            order: vec![apps[2].id, apps[0].id, apps[1].id],
            ..UserPreferences::default()
        };
        assert_eq!(names(&prefs.apply(&apps)), ["c", "a", "b"]);
    }

    #[rstest]
    fn residual_entries_append_in_original_relative_order() {
        let apps = [entry("a"), entry("b"), entry("c"), entry("d")];
        let prefs = UserPreferences {
            order: vec![apps[2].id],
            ..UserPreferences::default()
        };
        assert_eq!(names(&prefs.apply(&apps)), ["c", "a", "b", "d"]);
    }

    #[rstest]
    fn stale_ids_are_skipped() {
        let apps = [entry("a"), entry("b")];
        let prefs = UserPreferences {
            order: vec![Uuid::new_v4(), apps[1].id, apps[0].id],
            ..UserPreferences::default()
        };
        assert_eq!(names(&prefs.apply(&apps)), ["b", "a"]);
    }

    #[rstest]
    fn toggle_favorite_is_an_involution() {
        let id = Uuid::new_v4();
        let mut prefs = UserPreferences::default();
        let original = prefs.favorites.clone();

        prefs.toggle_favorite(id);
        assert!(prefs.favorites.contains(&id));
        prefs.toggle_favorite(id);
        assert_eq!(prefs.favorites, original);
    }

    #[rstest]
    fn apply_never_mutates_the_input() {
        let apps = [entry("a"), entry("b")];
        let before = apps.to_vec();
        let prefs = UserPreferences {
            order: vec![apps[1].id, apps[0].id],
            ..UserPreferences::default()
        };
        let _ = prefs.apply(&apps);
        assert_eq!(apps.to_vec(), before);
    }
}
