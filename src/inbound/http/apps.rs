//! App catalogue HTTP handlers.
//!
//! ```text
//! GET    /api/v1/apps          merged, per-user annotated list
//! POST   /api/v1/apps          append an entry            (admin)
//! PUT    /api/v1/apps/order    permutation reorder        (admin)
//! PUT    /api/v1/apps/{index}  partial update             (admin)
//! DELETE /api/v1/apps/{index}  delete                     (admin)
//! ```
//!
//! Admin mutations address entries by their position in the current list;
//! user preferences are insulated from that by stable entry ids.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use super::error::ApiResult;
use super::session::SessionContext;
use super::state::HttpState;
use crate::domain::ports::StoreError;
use crate::domain::{
    AccessDecision, AccessRequirement, AppCatalogue, AppEntry, AppView, Error, UserIdentity,
    authorize,
};

/// Request payload for creating an entry.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAppRequest {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    pub icon: Option<String>,
}

/// Request payload for a partial update; absent fields keep their value.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppRequest {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Request payload for reordering the catalogue.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderRequest {
    /// Complete permutation of the current positions, new order first.
    pub order: Vec<usize>,
}

/// Response payload for the merged app list.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppListResponse {
    pub apps: Vec<AppView>,
    pub is_admin: bool,
    pub theme: String,
}

/// Gate a handler on the session identity; admin actions respond 403 for
/// authenticated non-admins, never a redirect.
fn require(
    state: &HttpState,
    session: &SessionContext,
    requirement: AccessRequirement,
) -> Result<UserIdentity, Error> {
    let identity = session.identity()?;
    let decision = authorize(identity.as_ref(), requirement, &state.admin_policy);
    match (decision, identity) {
        (AccessDecision::Allow, Some(identity)) => Ok(identity),
        (AccessDecision::Forbidden, _) => Err(Error::forbidden("administrator access required")),
        _ => Err(Error::unauthorized("login required")),
    }
}

fn map_store_error(error: StoreError) -> Error {
    match error {
        StoreError::InvalidCatalogue { position, reason } => {
            Error::invalid_request(format!("invalid entry at position {position}: {reason}"))
                .with_details(json!({ "position": position }))
        }
        other => Error::internal(format!("catalogue store failure: {other}")),
    }
}

fn entry_at(catalogue: &AppCatalogue, index: usize) -> Result<(), Error> {
    if index >= catalogue.apps.len() {
        return Err(Error::not_found(format!("no app at position {index}"))
            .with_details(json!({ "index": index, "len": catalogue.apps.len() })));
    }
    Ok(())
}

/// Fetch the catalogue merged with the caller's preferences.
#[utoipa::path(
    get,
    path = "/api/v1/apps",
    tags = ["apps"],
    responses(
        (status = 200, description = "Personalised app list", body = AppListResponse),
        (status = 401, description = "Login required")
    )
)]
#[get("/api/v1/apps")]
pub async fn list_apps(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AppListResponse>> {
    let identity = require(&state, &session, AccessRequirement::LoggedIn)?;
    let catalogue = state.catalogue.load().await;
    let preferences = state.preferences.get(&identity.id).await;
    Ok(web::Json(AppListResponse {
        apps: preferences.apply(&catalogue.apps),
        is_admin: state.admin_policy.is_admin(&identity.email),
        theme: preferences.theme,
    }))
}

/// Append a new entry to the catalogue.
#[utoipa::path(
    post,
    path = "/api/v1/apps",
    request_body = NewAppRequest,
    tags = ["apps"],
    responses(
        (status = 201, description = "Entry created"),
        (status = 400, description = "Invalid entry"),
        (status = 401, description = "Login required"),
        (status = 403, description = "Admin required")
    )
)]
#[post("/api/v1/apps")]
pub async fn create_app(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<NewAppRequest>,
) -> ApiResult<HttpResponse> {
    let admin = require(&state, &session, AccessRequirement::Admin)?;
    let payload = payload.into_inner();
    let entry = AppEntry::new(payload.name, payload.url, payload.description, payload.icon)
        .map_err(|error| Error::invalid_request(error.to_string()))?;

    let mut catalogue = state.catalogue.load().await;
    catalogue.apps.push(entry.clone());
    state
        .catalogue
        .save(&catalogue)
        .await
        .map_err(map_store_error)?;
    info!(admin = %admin.email, app = %entry.name, "catalogue entry added");
    Ok(HttpResponse::Created().json(entry))
}

/// Merge supplied fields onto the entry at `index`. The id never changes.
#[utoipa::path(
    put,
    path = "/api/v1/apps/{index}",
    request_body = UpdateAppRequest,
    params(("index" = usize, Path, description = "Position in the current list")),
    tags = ["apps"],
    responses(
        (status = 200, description = "Entry updated"),
        (status = 400, description = "Update breaks entry invariants"),
        (status = 403, description = "Admin required"),
        (status = 404, description = "No entry at that position")
    )
)]
#[put("/api/v1/apps/{index}")]
pub async fn update_app(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<usize>,
    payload: web::Json<UpdateAppRequest>,
) -> ApiResult<HttpResponse> {
    let admin = require(&state, &session, AccessRequirement::Admin)?;
    let index = path.into_inner();
    let payload = payload.into_inner();

    let mut catalogue = state.catalogue.load().await;
    entry_at(&catalogue, index)?;
    let entry = &mut catalogue.apps[index];
    if let Some(name) = payload.name {
        entry.name = name;
    }
    if let Some(url) = payload.url {
        entry.url = url;
    }
    if let Some(description) = payload.description {
        entry.description = description;
    }
    if let Some(icon) = payload.icon {
        entry.icon = icon;
    }
    entry
        .validate()
        .map_err(|error| Error::invalid_request(error.to_string()))?;
    let updated = entry.clone();

    state
        .catalogue
        .save(&catalogue)
        .await
        .map_err(map_store_error)?;
    info!(admin = %admin.email, app = %updated.name, "catalogue entry updated");
    Ok(HttpResponse::Ok().json(updated))
}

/// Delete the entry at `index`.
#[utoipa::path(
    delete,
    path = "/api/v1/apps/{index}",
    params(("index" = usize, Path, description = "Position in the current list")),
    tags = ["apps"],
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 403, description = "Admin required"),
        (status = 404, description = "No entry at that position")
    )
)]
#[delete("/api/v1/apps/{index}")]
pub async fn delete_app(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<usize>,
) -> ApiResult<HttpResponse> {
    let admin = require(&state, &session, AccessRequirement::Admin)?;
    let index = path.into_inner();

    let mut catalogue = state.catalogue.load().await;
    entry_at(&catalogue, index)?;
    let removed = catalogue.apps.remove(index);
    state
        .catalogue
        .save(&catalogue)
        .await
        .map_err(map_store_error)?;
    info!(admin = %admin.email, app = %removed.name, "catalogue entry deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Reorder the catalogue; the supplied sequence must be a complete
/// permutation of the current positions or nothing is written.
#[utoipa::path(
    put,
    path = "/api/v1/apps/order",
    request_body = ReorderRequest,
    tags = ["apps"],
    responses(
        (status = 200, description = "Catalogue reordered"),
        (status = 400, description = "Sequence is not a permutation of the current positions"),
        (status = 403, description = "Admin required")
    )
)]
#[put("/api/v1/apps/order")]
pub async fn reorder_apps(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ReorderRequest>,
) -> ApiResult<HttpResponse> {
    let admin = require(&state, &session, AccessRequirement::Admin)?;

    let mut catalogue = state.catalogue.load().await;
    catalogue
        .reorder(&payload.order)
        .map_err(Error::invalid_request)?;
    state
        .catalogue
        .save(&catalogue)
        .await
        .map_err(map_store_error)?;
    info!(admin = %admin.email, "catalogue reordered");
    Ok(HttpResponse::Ok().json(catalogue))
}
