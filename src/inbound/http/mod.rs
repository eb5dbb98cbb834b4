//! HTTP inbound adapter exposing the launcher's REST endpoints and the
//! browser-facing OAuth routes.

pub mod apps;
pub mod auth;
pub mod error;
pub mod health;
pub mod preferences;
pub mod schemas;
pub mod session;
pub mod state;

pub use error::{ApiError, ApiResult};
