//! Launchpad entry-point: wires the OIDC sign-in flow, the catalogue and
//! preference stores, and the HTTP server.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use launchpad::domain::AdminPolicy;
use launchpad::inbound::http::health::HealthState;
use launchpad::inbound::http::state::HttpState;
use launchpad::outbound::{JsonCatalogueStore, JsonPreferenceStore, OidcProvider};
use launchpad::server::{
    BuildMode, PortalSettings, ServerConfig, create_server, session_settings_from_env,
};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    let mode = BuildMode::from_debug_assertions();
    let settings = PortalSettings::load().map_err(std::io::Error::other)?;
    settings.validate(mode).map_err(std::io::Error::other)?;
    let session =
        session_settings_from_env(&DefaultEnv::default(), mode).map_err(std::io::Error::other)?;

    let provider = OidcProvider::new(
        settings.discovery_url().map_err(std::io::Error::other)?,
        settings.redirect_url().map_err(std::io::Error::other)?,
        settings.credentials(),
    )
    .map_err(std::io::Error::other)?;

    let state = HttpState {
        catalogue: Arc::new(JsonCatalogueStore::new(settings.apps_file())),
        preferences: Arc::new(JsonPreferenceStore::new(settings.preferences_dir())),
        identity_provider: Arc::new(provider),
        admin_policy: AdminPolicy::new(settings.admin_emails()),
        allowed_domain: settings.allowed_domain().to_owned(),
    };

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        settings.bind_addr().map_err(std::io::Error::other)?,
        state,
    );
    create_server(health_state, config)?.await
}
