//! Ports: the traits adapters implement, plus their error types.
//!
//! Handlers depend on these traits through [`crate::inbound::http::state::HttpState`]
//! so the whole HTTP surface can be exercised with in-memory fixtures.

use async_trait::async_trait;
use thiserror::Error as ThisError;
use url::Url;

use super::app::AppCatalogue;
use super::identity::ProviderClaims;
use super::preferences::UserPreferences;

/// Failures raised by the file-backed stores.
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialise document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("refusing to persist an invalid catalogue: entry {position}: {reason}")]
    InvalidCatalogue { position: usize, reason: String },
}

/// Source of truth for the shared app catalogue.
///
/// `load` is infallible by contract: absence, corruption, and empty results
/// all degrade to the built-in default catalogue (logged by the adapter).
#[async_trait]
pub trait CatalogueStore: Send + Sync {
    async fn load(&self) -> AppCatalogue;

    /// Re-validate and persist the whole catalogue atomically.
    async fn save(&self, catalogue: &AppCatalogue) -> Result<(), StoreError>;
}

/// Per-user preference documents, keyed by the provider subject.
///
/// `get` degrades to defaults when the document is missing or unreadable.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, user_id: &str) -> UserPreferences;

    async fn set(&self, user_id: &str, preferences: &UserPreferences) -> Result<(), StoreError>;
}

/// Failures talking to the OIDC provider.
///
/// Every variant is caught at the HTTP boundary and converted into a
/// redirect with a user-facing message; none of them propagate as a fault.
#[derive(Debug, ThisError)]
pub enum ProviderError {
    #[error("single sign-on is not configured")]
    Unconfigured,
    #[error("could not reach the identity provider: {0}")]
    Transport(String),
    #[error("identity provider returned HTTP {status}")]
    Status { status: u16 },
    #[error("token exchange rejected: {0}")]
    Rejected(String),
    #[error("malformed identity provider response: {0}")]
    Malformed(String),
}

/// An authorization request prepared for the browser redirect.
#[derive(Debug, Clone)]
pub struct AuthorizationRedirect {
    /// Provider authorization endpoint with query parameters applied.
    pub url: Url,
    /// Random CSRF token to stash in the session and verify at callback.
    pub state: String,
}

/// External OIDC identity provider (authorization-code flow).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch discovery and build the authorization redirect.
    async fn begin(&self) -> Result<AuthorizationRedirect, ProviderError>;

    /// Exchange an authorization code for tokens and fetch userinfo claims.
    async fn complete(&self, code: &str) -> Result<ProviderClaims, ProviderError>;
}
