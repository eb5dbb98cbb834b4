//! User preference HTTP handlers.
//!
//! ```text
//! GET  /api/v1/users/me/preferences          read stored preferences
//! POST /api/v1/users/me/favorites/{app_id}   toggle a favourite
//! PUT  /api/v1/users/me/order                replace the personal order
//! ```
//!
//! Preferences are an overlay: these handlers never touch the shared
//! catalogue, only the caller's own document.

use std::collections::BTreeSet;

use actix_web::{get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::ApiResult;
use super::session::SessionContext;
use super::state::HttpState;
use crate::domain::{Error, UserPreferences};

/// Response payload mirroring the stored preference document.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesResponse {
    pub favorites: Vec<Uuid>,
    pub order: Vec<Uuid>,
    pub theme: String,
}

impl From<UserPreferences> for PreferencesResponse {
    fn from(value: UserPreferences) -> Self {
        Self {
            favorites: value.favorites.into_iter().collect(),
            order: value.order,
            theme: value.theme,
        }
    }
}

/// Request payload replacing the caller's personal order.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderRequest {
    pub order: Vec<Uuid>,
}

fn persist_failure(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("preference store failure: {error}"))
}

/// Read the caller's stored preferences.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/preferences",
    tags = ["preferences"],
    responses(
        (status = 200, description = "Stored preferences", body = PreferencesResponse),
        (status = 401, description = "Login required")
    )
)]
#[get("/api/v1/users/me/preferences")]
pub async fn get_preferences(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<PreferencesResponse>> {
    let identity = session.require_identity()?;
    let preferences = state.preferences.get(&identity.id).await;
    Ok(web::Json(PreferencesResponse::from(preferences)))
}

/// Toggle one app in the caller's favourites (symmetric difference).
#[utoipa::path(
    post,
    path = "/api/v1/users/me/favorites/{app_id}",
    params(("app_id" = Uuid, Path, description = "Stable id of the app")),
    tags = ["preferences"],
    responses(
        (status = 200, description = "Updated preferences", body = PreferencesResponse),
        (status = 401, description = "Login required"),
        (status = 404, description = "No such app")
    )
)]
#[post("/api/v1/users/me/favorites/{app_id}")]
pub async fn toggle_favorite(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<PreferencesResponse>> {
    let identity = session.require_identity()?;
    let app_id = path.into_inner();

    let catalogue = state.catalogue.load().await;
    if !catalogue.contains(app_id) {
        return Err(Error::not_found("no app with that id")
            .with_details(json!({ "appId": app_id }))
            .into());
    }

    let mut preferences = state.preferences.get(&identity.id).await;
    preferences.toggle_favorite(app_id);
    state
        .preferences
        .set(&identity.id, &preferences)
        .await
        .map_err(persist_failure)?;
    Ok(web::Json(PreferencesResponse::from(preferences)))
}

/// Replace the caller's personal order wholesale.
///
/// Every id must reference a current app and appear at most once; a partial
/// order (fewer ids than apps) is allowed, residual apps follow in
/// catalogue order when the list is rendered.
#[utoipa::path(
    put,
    path = "/api/v1/users/me/order",
    request_body = OrderRequest,
    tags = ["preferences"],
    responses(
        (status = 200, description = "Updated preferences", body = PreferencesResponse),
        (status = 400, description = "Unknown or duplicate app id"),
        (status = 401, description = "Login required")
    )
)]
#[put("/api/v1/users/me/order")]
pub async fn update_order(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<OrderRequest>,
) -> ApiResult<web::Json<PreferencesResponse>> {
    let identity = session.require_identity()?;
    let order = payload.into_inner().order;

    let catalogue = state.catalogue.load().await;
    let mut seen = BTreeSet::new();
    for id in &order {
        if !catalogue.contains(*id) {
            return Err(Error::invalid_request("order references an unknown app")
                .with_details(json!({ "appId": id }))
                .into());
        }
        if !seen.insert(*id) {
            return Err(Error::invalid_request("order repeats an app id")
                .with_details(json!({ "appId": id }))
                .into());
        }
    }

    let mut preferences = state.preferences.get(&identity.id).await;
    preferences.order = order;
    state
        .preferences
        .set(&identity.id, &preferences)
        .await
        .map_err(persist_failure)?;
    Ok(web::Json(PreferencesResponse::from(preferences)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::Value;

    use crate::inbound::http::apps::list_apps;
    use crate::server::test_session_middleware;
    use crate::server::testing::{login_as, seeded_state};

    async fn user_app()
    -> (
        impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        actix_web::cookie::Cookie<'static>,
    ) {
        let state = seeded_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(test_session_middleware())
                .service(list_apps)
                .service(get_preferences)
                .service(toggle_favorite)
                .service(update_order),
        )
        .await;
        let user = login_as(&app, "user@lynxx.com").await;
        (app, user)
    }

    async fn app_ids(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        cookie: &actix_web::cookie::Cookie<'static>,
    ) -> Vec<Uuid> {
        let res = test::call_service(
            app,
            test::TestRequest::get()
                .uri("/api/v1/apps")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        body["apps"]
            .as_array()
            .expect("apps array")
            .iter()
            .map(|app| {
                app["id"]
                    .as_str()
                    .and_then(|id| id.parse().ok())
                    .expect("app id")
            })
            .collect()
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_user_defaults_to_empty_preferences() {
        let (app, user) = user_app().await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/users/me/preferences")
                .cookie(user)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["favorites"], serde_json::json!([]));
        assert_eq!(body["order"], serde_json::json!([]));
        assert_eq!(body["theme"], "default");
    }

    #[rstest]
    #[actix_web::test]
    async fn favorite_toggle_round_trip() {
        let (app, user) = user_app().await;
        let ids = app_ids(&app, &user).await;

        let toggled = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/users/me/favorites/{}", ids[1]))
                .cookie(user.clone())
                .to_request(),
        )
        .await;
        assert_eq!(toggled.status(), StatusCode::OK);
        let body: Value = test::read_body_json(toggled).await;
        assert_eq!(body["favorites"].as_array().map(Vec::len), Some(1));

        // The merged list reflects the favourite.
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/apps")
                .cookie(user.clone())
                .to_request(),
        )
        .await;
        let list: Value = test::read_body_json(res).await;
        assert_eq!(list["apps"][1]["isFavorite"], true);
        assert_eq!(list["apps"][0]["isFavorite"], false);

        // Toggling again restores the original set.
        let toggled = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/users/me/favorites/{}", ids[1]))
                .cookie(user)
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(toggled).await;
        assert_eq!(body["favorites"].as_array().map(Vec::len), Some(0));
    }

    #[rstest]
    #[actix_web::test]
    async fn favorite_of_unknown_app_is_not_found() {
        let (app, user) = user_app().await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/users/me/favorites/{}", Uuid::new_v4()))
                .cookie(user)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn stored_order_drives_the_merged_list() {
        let (app, user) = user_app().await;
        let ids = app_ids(&app, &user).await;

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/v1/users/me/order")
                .cookie(user.clone())
                .set_json(serde_json::json!({ "order": [ids[2], ids[0], ids[1]] }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let reordered = app_ids(&app, &user).await;
        assert_eq!(reordered, vec![ids[2], ids[0], ids[1]]);
    }

    #[rstest]
    #[actix_web::test]
    async fn order_rejects_unknown_and_duplicate_ids() {
        let (app, user) = user_app().await;
        let ids = app_ids(&app, &user).await;

        for order in [
            serde_json::json!([Uuid::new_v4()]),
            serde_json::json!([ids[0], ids[0]]),
        ] {
            let res = test::call_service(
                &app,
                test::TestRequest::put()
                    .uri("/api/v1/users/me/order")
                    .cookie(user.clone())
                    .set_json(serde_json::json!({ "order": order }))
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn preferences_require_login() {
        let (app, _) = user_app().await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/users/me/preferences")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
