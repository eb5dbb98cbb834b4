//! Domain primitives and the preference-merge logic.
//!
//! Purpose: define strongly typed entities shared by the HTTP adapters and
//! the file-backed stores. Keep types transport agnostic and document
//! invariants and serialisation contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - `AppEntry` / `AppCatalogue`: the shared, admin-curated app list.
//! - `UserIdentity`: minimal identity record held in the session.
//! - `UserPreferences`: per-user favourites, ordering, and theme.
//! - `Error` / `ErrorCode`: transport-agnostic failure payloads.

pub mod access;
pub mod app;
pub mod error;
pub mod identity;
pub mod ports;
pub mod preferences;

pub use self::access::{AccessDecision, AccessRequirement, AdminPolicy, authorize};
pub use self::app::{AppCatalogue, AppEntry, EntryValidationError, default_catalogue};
pub use self::error::{Error, ErrorCode};
pub use self::identity::{AdmissionError, ProviderClaims, UserIdentity, admit_claims, domain_matches};
pub use self::preferences::{AppView, UserPreferences};

/// Convenient result alias for domain operations surfaced to adapters.
pub type ApiResult<T> = Result<T, Error>;
