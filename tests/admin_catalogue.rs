//! Admin catalogue mutations persisted through the JSON store.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use rstest::rstest;
use serde_json::Value;
use tempfile::TempDir;

use launchpad::domain::AdminPolicy;
use launchpad::inbound::http::apps::{create_app, delete_app, list_apps, reorder_apps, update_app};
use launchpad::inbound::http::state::HttpState;
use launchpad::outbound::{JsonCatalogueStore, JsonPreferenceStore};
use launchpad::server::test_session_middleware;
use launchpad::server::testing::{FixtureIdentityProvider, login_as};

fn file_backed_state(dir: &TempDir) -> HttpState {
    HttpState {
        catalogue: Arc::new(JsonCatalogueStore::new(dir.path().join("apps.json"))),
        preferences: Arc::new(JsonPreferenceStore::new(dir.path().join("user_preferences"))),
        identity_provider: Arc::new(FixtureIdentityProvider::echo()),
        admin_policy: AdminPolicy::new(vec!["admin@lynxx.com".to_owned()]),
        allowed_domain: "lynxx.com".to_owned(),
    }
}

async fn spawn_app(
    state: HttpState,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(test_session_middleware())
            .service(list_apps)
            .service(create_app)
            .service(reorder_apps)
            .service(update_app)
            .service(delete_app),
    )
    .await
}

async fn listed_names(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    cookie: &actix_web::cookie::Cookie<'static>,
) -> Vec<String> {
    let res = test::call_service(
        app,
        test::TestRequest::get()
            .uri("/api/v1/apps")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    body["apps"]
        .as_array()
        .expect("apps array")
        .iter()
        .filter_map(|app| app["name"].as_str().map(str::to_owned))
        .collect()
}

#[rstest]
#[actix_web::test]
async fn mutations_survive_a_restart() {
    let dir = TempDir::new().expect("temp dir");

    {
        let app = spawn_app(file_backed_state(&dir)).await;
        let admin = login_as(&app, "admin@lynxx.com").await;

        let created = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/apps")
                .cookie(admin.clone())
                .set_json(serde_json::json!({
                    "name": "Grafana",
                    "url": "https://grafana.example.com",
                    "description": "Dashboards",
                    "icon": "chart"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);

        let reordered = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/v1/apps/order")
                .cookie(admin.clone())
                .set_json(serde_json::json!({ "order": [3, 0, 1, 2] }))
                .to_request(),
        )
        .await;
        assert_eq!(reordered.status(), StatusCode::OK);

        let deleted = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri("/api/v1/apps/2")
                .cookie(admin.clone())
                .to_request(),
        )
        .await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let names = listed_names(&app, &admin).await;
        assert_eq!(names, ["Grafana", "Gmail", "Confluence"]);
    }

    // A fresh store over the same file sees the persisted catalogue.
    let app = spawn_app(file_backed_state(&dir)).await;
    let admin = login_as(&app, "admin@lynxx.com").await;
    let names = listed_names(&app, &admin).await;
    assert_eq!(names, ["Grafana", "Gmail", "Confluence"]);
}

#[rstest]
#[actix_web::test]
async fn corrupt_catalogue_file_degrades_to_defaults() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("apps.json"), b"{not json").expect("write corrupt file");

    let app = spawn_app(file_backed_state(&dir)).await;
    let admin = login_as(&app, "admin@lynxx.com").await;
    let names = listed_names(&app, &admin).await;
    assert_eq!(names, ["Gmail", "Harvest", "Confluence"]);
}

#[rstest]
#[actix_web::test]
async fn updates_are_rewritten_through_validation() {
    let dir = TempDir::new().expect("temp dir");
    let app = spawn_app(file_backed_state(&dir)).await;
    let admin = login_as(&app, "admin@lynxx.com").await;

    // Clearing a required field is refused and nothing is persisted.
    let rejected = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/v1/apps/0")
            .cookie(admin.clone())
            .set_json(serde_json::json!({ "url": "" }))
            .to_request(),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let accepted = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/v1/apps/0")
            .cookie(admin.clone())
            .set_json(serde_json::json!({ "url": "https://mail.example.com" }))
            .to_request(),
    )
    .await;
    assert_eq!(accepted.status(), StatusCode::OK);
    let body: Value = test::read_body_json(accepted).await;
    assert_eq!(body["url"], "https://mail.example.com");
    assert_eq!(body["name"], "Gmail");
}
