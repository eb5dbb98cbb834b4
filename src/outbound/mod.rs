//! Outbound adapters: file-backed stores and the OIDC provider client.

pub mod oidc;
pub mod store;

pub use oidc::OidcProvider;
pub use store::{JsonCatalogueStore, JsonPreferenceStore};
