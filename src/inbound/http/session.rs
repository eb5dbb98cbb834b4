//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Provides a thin wrapper around Actix sessions so handlers only deal with
//! domain-friendly operations: persisting and retrieving the identity
//! record and the login-flow CSRF state. The session is the only identity
//! cache; its TTL bounds how long a stale identity persists.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, UserIdentity};

pub(crate) const IDENTITY_KEY: &str = "identity";
pub(crate) const LOGIN_STATE_KEY: &str = "login_state";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the admitted identity in the session cookie.
    pub fn persist_identity(&self, identity: &UserIdentity) -> Result<(), Error> {
        self.0
            .insert(IDENTITY_KEY, identity)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the current identity from the session, if present.
    pub fn identity(&self) -> Result<Option<UserIdentity>, Error> {
        match self.0.get::<UserIdentity>(IDENTITY_KEY) {
            Ok(identity) => Ok(identity),
            Err(error) => {
                tracing::warn!(%error, "unreadable identity in session cookie");
                Ok(None)
            }
        }
    }

    /// Require an established identity or return `401 Unauthorized`.
    pub fn require_identity(&self) -> Result<UserIdentity, Error> {
        self.identity()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Stash the CSRF state for an in-flight login.
    pub fn store_login_state(&self, state: &str) -> Result<(), Error> {
        self.0
            .insert(LOGIN_STATE_KEY, state)
            .map_err(|error| Error::internal(format!("failed to persist login state: {error}")))
    }

    /// Remove and return the stashed CSRF state, if any.
    pub fn take_login_state(&self) -> Option<String> {
        self.0
            .remove_as::<String>(LOGIN_STATE_KEY)
            .and_then(Result::ok)
    }

    /// Clear all session state (logout).
    pub fn purge(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
