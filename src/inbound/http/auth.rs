//! Browser-facing OAuth routes: login begin, callback, logout.
//!
//! These handlers never surface a fault to the browser: every provider or
//! admission failure is logged and converted into a redirect to the login
//! page with a user-facing message.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::form_urlencoded;
use utoipa::ToSchema;

use super::session::SessionContext;
use super::state::{HOME_PATH, HttpState, LOGIN_PATH};
use crate::domain::admit_claims;

/// Query parameters the provider may hand back to the callback route.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Query parameters for the login landing route.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Body returned by the login landing route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPageResponse {
    pub sign_in_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn redirect_to(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location))
        .finish()
}

/// Redirect to the login page carrying a user-facing message.
fn login_redirect(message: &str) -> HttpResponse {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("error", message)
        .finish();
    redirect_to(&format!("{LOGIN_PATH}?{query}"))
}

/// Begin the OAuth login: redirect the browser to the provider.
#[utoipa::path(
    get,
    path = "/auth/login",
    tags = ["auth"],
    security([]),
    responses(
        (status = 303, description = "Redirect to the identity provider, or back to the login page with a message on failure")
    )
)]
#[get("/auth/login")]
pub async fn begin_login(state: web::Data<HttpState>, session: SessionContext) -> HttpResponse {
    let redirect = match state.identity_provider.begin().await {
        Ok(redirect) => redirect,
        Err(error) => {
            warn!(%error, "could not start the sign-in flow");
            return login_redirect(&format!("Could not start sign-in: {error}"));
        }
    };
    if let Err(error) = session.store_login_state(&redirect.state) {
        warn!(%error, "could not stash login state in the session");
        return login_redirect("Could not start sign-in: session unavailable");
    }
    redirect_to(redirect.url.as_str())
}

/// Complete the OAuth login: exchange the code, admit the claims, establish
/// the session.
#[utoipa::path(
    get,
    path = "/auth/callback",
    tags = ["auth"],
    security([]),
    responses(
        (status = 303, description = "Redirect home on success, or to the login page with a message on failure")
    )
)]
#[get("/auth/callback")]
pub async fn login_callback(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<CallbackQuery>,
) -> HttpResponse {
    if let Some(error) = &query.error {
        warn!(provider_error = %error, "identity provider reported an error");
        return login_redirect("Sign-in was cancelled or refused by the provider");
    }
    let Some(code) = query.code.as_deref().filter(|code| !code.is_empty()) else {
        return login_redirect("Sign-in failed: no authorization code received");
    };

    // CSRF gate: the state must match what we stashed at login begin.
    let expected = session.take_login_state();
    if expected.is_none() || expected.as_deref() != query.state.as_deref() {
        warn!("login state mismatch at callback");
        return login_redirect("Sign-in failed: login state mismatch, please retry");
    }

    let claims = match state.identity_provider.complete(code).await {
        Ok(claims) => claims,
        Err(error) => {
            warn!(%error, "authorization code exchange failed");
            return login_redirect(&format!("Sign-in failed: {error}"));
        }
    };

    let identity = match admit_claims(claims, &state.allowed_domain) {
        Ok(identity) => identity,
        Err(error) => {
            warn!(%error, "admission gate rejected the sign-in");
            return login_redirect(&error.to_string());
        }
    };

    if let Err(error) = session.persist_identity(&identity) {
        warn!(%error, "could not establish the session");
        return login_redirect("Sign-in failed: could not establish a session");
    }
    info!(user = %identity.email, "user signed in");
    redirect_to(HOME_PATH)
}

/// Clear the session and return to the login page.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tags = ["auth"],
    responses((status = 303, description = "Session cleared; redirect to the login page"))
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    redirect_to(LOGIN_PATH)
}

/// Minimal login landing: reports where to start sign-in and echoes any
/// failure message from a redirect.
#[utoipa::path(
    get,
    path = "/login",
    tags = ["auth"],
    security([]),
    responses((status = 200, description = "Login landing data", body = LoginPageResponse))
)]
#[get("/login")]
pub async fn login_page(query: web::Query<LoginQuery>) -> HttpResponse {
    HttpResponse::Ok().json(LoginPageResponse {
        sign_in_url: "/auth/login".to_owned(),
        error: query.into_inner().error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;

    use crate::domain::ProviderClaims;
    use crate::inbound::http::apps::list_apps;
    use crate::server::test_session_middleware;
    use crate::server::testing::{FixtureIdentityProvider, test_state};

    fn location(res: &actix_web::dev::ServiceResponse) -> String {
        res.headers()
            .get("Location")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned()
    }

    async fn run_callback(
        claims: Result<ProviderClaims, ()>,
        uri_tail: &str,
    ) -> (StatusCode, String, bool) {
        let provider = match claims {
            Ok(claims) => FixtureIdentityProvider::admitting(claims),
            Err(()) => FixtureIdentityProvider::failing(),
        };
        let state = test_state(provider);
        let app = test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state))
                .wrap(test_session_middleware())
                .service(begin_login)
                .service(login_callback)
                .service(list_apps),
        )
        .await;

        // Begin to stash the CSRF state, then replay it at the callback.
        let begin =
            test::call_service(&app, test::TestRequest::get().uri("/auth/login").to_request())
                .await;
        let cookie = begin
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .map(|c| c.into_owned());

        let mut request = test::TestRequest::get().uri(&format!("/auth/callback{uri_tail}"));
        if let Some(cookie) = cookie.clone() {
            request = request.cookie(cookie);
        }
        let callback = test::call_service(&app, request.to_request()).await;
        let status = callback.status();
        let target = location(&callback);

        // A session exists iff the apps endpoint accepts the callback cookie.
        let session_cookie = callback
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .map(|c| c.into_owned())
            .or(cookie);
        let mut apps_request = test::TestRequest::get().uri("/api/v1/apps");
        if let Some(cookie) = session_cookie {
            apps_request = apps_request.cookie(cookie);
        }
        let apps = test::call_service(&app, apps_request.to_request()).await;
        (status, target, apps.status() == StatusCode::OK)
    }

    fn verified_claims() -> ProviderClaims {
        ProviderClaims {
            sub: "subject-1".into(),
            email: Some("user@lynxx.com".into()),
            email_verified: true,
            name: "Alex Example".into(),
            given_name: "Alex".into(),
            picture: String::new(),
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn successful_callback_establishes_a_session() {
        let (status, target, logged_in) =
            run_callback(Ok(verified_claims()), "?code=abc&state=fixture-state").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(target, "/");
        assert!(logged_in);
    }

    #[rstest]
    #[actix_web::test]
    async fn unverified_email_never_creates_a_session() {
        let mut claims = verified_claims();
        claims.email_verified = false;
        let (status, target, logged_in) =
            run_callback(Ok(claims), "?code=abc&state=fixture-state").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(target.starts_with("/login?error="));
        assert!(!logged_in);
    }

    #[rstest]
    #[actix_web::test]
    async fn wrong_domain_is_turned_away() {
        let mut claims = verified_claims();
        claims.email = Some("user@other.com".into());
        let (_, target, logged_in) = run_callback(Ok(claims), "?code=abc&state=fixture-state").await;
        assert!(target.starts_with("/login?error="));
        assert!(!logged_in);
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_code_fails_closed() {
        let (_, target, logged_in) = run_callback(Ok(verified_claims()), "").await;
        assert!(target.contains("no+authorization+code"));
        assert!(!logged_in);
    }

    #[rstest]
    #[actix_web::test]
    async fn state_mismatch_fails_closed() {
        let (_, target, logged_in) =
            run_callback(Ok(verified_claims()), "?code=abc&state=tampered").await;
        assert!(target.contains("state+mismatch"));
        assert!(!logged_in);
    }

    #[rstest]
    #[actix_web::test]
    async fn provider_failure_redirects_with_message() {
        let (status, target, logged_in) =
            run_callback(Err(()), "?code=abc&state=fixture-state").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(target.starts_with("/login?error="));
        assert!(!logged_in);
    }

    #[rstest]
    #[actix_web::test]
    async fn logout_purges_the_session() {
        let state = test_state(FixtureIdentityProvider::admitting(verified_claims()));
        let app = test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state))
                .wrap(test_session_middleware())
                .service(begin_login)
                .service(login_callback)
                .service(logout)
                .service(list_apps),
        )
        .await;

        let begin =
            test::call_service(&app, test::TestRequest::get().uri("/auth/login").to_request())
                .await;
        let cookie = begin
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .map(|c| c.into_owned())
            .expect("session cookie");
        let callback = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/auth/callback?code=abc&state=fixture-state")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let session_cookie = callback
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .map(|c| c.into_owned())
            .expect("authenticated cookie");

        let out = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/auth/logout")
                .cookie(session_cookie)
                .to_request(),
        )
        .await;
        assert_eq!(out.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&out), "/login");

        let cleared = out
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .map(|c| c.into_owned());
        let mut apps_request = test::TestRequest::get().uri("/api/v1/apps");
        if let Some(cookie) = cleared {
            apps_request = apps_request.cookie(cookie);
        }
        let apps = test::call_service(&app, apps_request.to_request()).await;
        assert_eq!(apps.status(), StatusCode::UNAUTHORIZED);
    }
}
