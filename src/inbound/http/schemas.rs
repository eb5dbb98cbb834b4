//! OpenAPI schema wrappers for the error envelope.
//!
//! Keeps the generated document self-contained without coupling handler
//! signatures to utoipa-only types.

use serde::Serialize;
use utoipa::ToSchema;

/// Error envelope as it appears on the wire.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSchema {
    #[schema(example = "forbidden")]
    pub code: String,
    #[schema(example = "administrator access required")]
    pub message: String,
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub trace_id: Option<String>,
    pub details: Option<serde_json::Value>,
}
