//! OpenAPI documentation configuration.
//!
//! Defines [`ApiDoc`], which generates the OpenAPI specification for the
//! REST API: the catalogue, preference, auth, and health paths, the wire
//! schemas, and the session cookie security scheme. Swagger UI serves the
//! document in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::schemas::ErrorSchema;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued after a successful OIDC callback.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Launchpad API",
        description = "Domain-gated app launcher: shared catalogue with per-user overlays."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::begin_login,
        crate::inbound::http::auth::login_callback,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::login_page,
        crate::inbound::http::apps::list_apps,
        crate::inbound::http::apps::create_app,
        crate::inbound::http::apps::update_app,
        crate::inbound::http::apps::delete_app,
        crate::inbound::http::apps::reorder_apps,
        crate::inbound::http::preferences::get_preferences,
        crate::inbound::http::preferences::toggle_favorite,
        crate::inbound::http::preferences::update_order,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema)),
    tags(
        (name = "auth", description = "OIDC sign-in flow and session lifecycle"),
        (name = "apps", description = "Shared app catalogue"),
        (name = "preferences", description = "Per-user catalogue overlays"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document references the wire surface.

    use super::*;

    #[test]
    fn openapi_error_schema_has_envelope_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("ErrorSchema").expect("ErrorSchema");

        let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(object)) =
            error_schema
        else {
            panic!("expected object schema");
        };
        for field in ["code", "message", "traceId", "details"] {
            assert!(
                object.properties.contains_key(field),
                "schema should have field '{field}'"
            );
        }
    }

    #[test]
    fn openapi_covers_the_catalogue_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/auth/callback",
            "/auth/logout",
            "/api/v1/apps",
            "/api/v1/apps/order",
            "/api/v1/users/me/preferences",
            "/health/ready",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "document should describe {path}"
            );
        }
    }
}
