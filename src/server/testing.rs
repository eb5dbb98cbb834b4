//! In-memory fixtures for exercising the HTTP surface without real I/O or
//! a reachable identity provider.
//!
//! Shared between `#[cfg(test)]` modules and the integration tests, so the
//! module is compiled unconditionally.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, test, web};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::domain::ports::{
    AuthorizationRedirect, CatalogueStore, IdentityProvider, PreferenceStore, ProviderError,
    StoreError,
};
use crate::domain::{
    AdminPolicy, AppCatalogue, ProviderClaims, UserIdentity, UserPreferences, default_catalogue,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::server::test_session_middleware;

/// CSRF state the fixture provider hands out at `begin`.
pub const FIXTURE_STATE: &str = "fixture-state";

/// Deterministic provider subject for `email`, safe as a store key.
fn fixture_subject(email: &str) -> String {
    let tail: String = email
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("sub-{tail}")
}

enum FixtureMode {
    /// `complete` succeeds with verified claims whose email is the code.
    Echo,
    /// `complete` succeeds with the given claims regardless of the code.
    Admitting(ProviderClaims),
    /// `complete` fails with a transport error.
    Failing,
}

/// Identity provider stand-in with scripted outcomes.
pub struct FixtureIdentityProvider {
    mode: FixtureMode,
}

impl FixtureIdentityProvider {
    /// Provider that admits whoever the authorization code names.
    #[must_use]
    pub fn echo() -> Self {
        Self {
            mode: FixtureMode::Echo,
        }
    }

    /// Provider that always returns the given claims.
    #[must_use]
    pub fn admitting(claims: ProviderClaims) -> Self {
        Self {
            mode: FixtureMode::Admitting(claims),
        }
    }

    /// Provider whose token exchange always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            mode: FixtureMode::Failing,
        }
    }
}

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn begin(&self) -> Result<AuthorizationRedirect, ProviderError> {
        let url = Url::parse("https://sso.fixture.invalid/authorize")
            .map_err(|error| ProviderError::Malformed(error.to_string()))?;
        Ok(AuthorizationRedirect {
            url,
            state: FIXTURE_STATE.to_owned(),
        })
    }

    async fn complete(&self, code: &str) -> Result<ProviderClaims, ProviderError> {
        match &self.mode {
            FixtureMode::Echo => Ok(ProviderClaims {
                sub: fixture_subject(code),
                email: Some(code.to_owned()),
                email_verified: true,
                name: "Fixture User".to_owned(),
                given_name: "Fixture".to_owned(),
                picture: String::new(),
            }),
            FixtureMode::Admitting(claims) => Ok(claims.clone()),
            FixtureMode::Failing => {
                Err(ProviderError::Transport("fixture provider is down".into()))
            }
        }
    }
}

/// Catalogue store backed by an in-process mutex.
pub struct FixtureCatalogueStore {
    catalogue: Mutex<AppCatalogue>,
}

impl FixtureCatalogueStore {
    #[must_use]
    pub fn new(catalogue: AppCatalogue) -> Self {
        Self {
            catalogue: Mutex::new(catalogue),
        }
    }
}

#[async_trait]
impl CatalogueStore for FixtureCatalogueStore {
    async fn load(&self) -> AppCatalogue {
        self.catalogue.lock().expect("catalogue fixture lock").clone()
    }

    async fn save(&self, catalogue: &AppCatalogue) -> Result<(), StoreError> {
        *self.catalogue.lock().expect("catalogue fixture lock") = catalogue.clone();
        Ok(())
    }
}

/// Preference store backed by an in-process map.
#[derive(Default)]
pub struct FixturePreferenceStore {
    preferences: Mutex<HashMap<String, UserPreferences>>,
}

#[async_trait]
impl PreferenceStore for FixturePreferenceStore {
    async fn get(&self, user_id: &str) -> UserPreferences {
        self.preferences
            .lock()
            .expect("preference fixture lock")
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn set(&self, user_id: &str, preferences: &UserPreferences) -> Result<(), StoreError> {
        self.preferences
            .lock()
            .expect("preference fixture lock")
            .insert(user_id.to_owned(), preferences.clone());
        Ok(())
    }
}

/// HTTP state wired to fixtures, with `admin@lynxx.com` on the allowlist.
#[must_use]
pub fn test_state(provider: FixtureIdentityProvider) -> HttpState {
    HttpState {
        catalogue: Arc::new(FixtureCatalogueStore::new(default_catalogue())),
        preferences: Arc::new(FixturePreferenceStore::default()),
        identity_provider: Arc::new(provider),
        admin_policy: AdminPolicy::new(vec!["admin@lynxx.com".to_owned()]),
        allowed_domain: "lynxx.com".to_owned(),
    }
}

/// [`test_state`] with the echoing provider and the default catalogue.
#[must_use]
pub fn seeded_state() -> HttpState {
    test_state(FixtureIdentityProvider::echo())
}

#[derive(Deserialize)]
struct MintQuery {
    email: String,
}

/// Mint a session cookie for `email` and check it against `app`.
///
/// The cookie is produced by a throwaway sign-in app sharing the
/// deterministic key of [`test_session_middleware`], then validated with a
/// catalogue listing on the service under test, which must therefore
/// register `list_apps`.
pub async fn login_as<S>(app: &S, email: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mint = test::init_service(App::new().wrap(test_session_middleware()).route(
        "/mint",
        web::get().to(|session: SessionContext, query: web::Query<MintQuery>| async move {
            let email = query.into_inner().email;
            let identity = UserIdentity {
                id: fixture_subject(&email),
                email,
                name: "Fixture User".to_owned(),
                given_name: "Fixture".to_owned(),
                picture: String::new(),
            };
            session.persist_identity(&identity)?;
            Ok::<_, crate::inbound::http::ApiError>(HttpResponse::Ok())
        }),
    ))
    .await;

    let encoded: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("email", email)
        .finish();
    let minted = test::call_service(
        &mint,
        test::TestRequest::get()
            .uri(&format!("/mint?{encoded}"))
            .to_request(),
    )
    .await;
    let cookie = minted
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(|cookie| cookie.into_owned())
        .expect("mint app sets a session cookie");

    let probe = test::call_service(
        app,
        test::TestRequest::get()
            .uri("/api/v1/apps")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(probe.status(), StatusCode::OK, "minted session not accepted");

    cookie
}
