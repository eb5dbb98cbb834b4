//! Explicit access-gate decisions for route handlers.
//!
//! Gating is a plain function producing an allow/deny decision that each
//! handler evaluates before doing work, rather than an implicit wrapper
//! around the handler. The HTTP layer maps `Unauthorized` to a 401 (or a
//! login redirect on browser routes) and `Forbidden` to a 403.

use super::identity::UserIdentity;

/// What a route demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequirement {
    /// Any established identity.
    LoggedIn,
    /// An identity whose email is on the admin allowlist.
    Admin,
}

/// Outcome of evaluating an [`AccessRequirement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// No identity in the session.
    Unauthorized,
    /// Identity present but not an admin.
    Forbidden,
}

/// The configured admin allowlist, compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    admins: Vec<String>,
}

impl AdminPolicy {
    /// Build a policy from configured admin email addresses.
    pub fn new(emails: impl IntoIterator<Item = String>) -> Self {
        Self {
            admins: emails
                .into_iter()
                .map(|email| email.trim().to_lowercase())
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }

    /// True iff `email` is on the allowlist.
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.admins.iter().any(|admin| admin == &email)
    }
}

/// Evaluate a requirement against the session identity, if any.
pub fn authorize(
    identity: Option<&UserIdentity>,
    requirement: AccessRequirement,
    policy: &AdminPolicy,
) -> AccessDecision {
    let Some(identity) = identity else {
        return AccessDecision::Unauthorized;
    };
    match requirement {
        AccessRequirement::LoggedIn => AccessDecision::Allow,
        AccessRequirement::Admin if policy.is_admin(&identity.email) => AccessDecision::Allow,
        AccessRequirement::Admin => AccessDecision::Forbidden,
    }
}
