//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without real I/O or a real
//! identity provider.

use std::sync::Arc;

use crate::domain::AdminPolicy;
use crate::domain::ports::{CatalogueStore, IdentityProvider, PreferenceStore};

/// Browser route the auth flow redirects to on failure.
pub const LOGIN_PATH: &str = "/login";
/// Browser route the auth flow redirects to on success.
pub const HOME_PATH: &str = "/";

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub catalogue: Arc<dyn CatalogueStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub admin_policy: AdminPolicy,
    /// Email domain required for admission (e.g. `lynxx.com`).
    pub allowed_domain: String,
}
