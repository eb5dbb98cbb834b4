//! User identity and the email-domain admission gate.
//!
//! Identities originate from the OIDC provider's userinfo document and are
//! held only in the cookie session. Admission happens once, at callback
//! time; the session is the sole identity cache afterwards (session TTL is
//! therefore the re-authentication bound).

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Minimal identity record stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Provider subject (`sub` claim): the stable user id.
    pub id: String,
    pub email: String,
    pub name: String,
    pub given_name: String,
    pub picture: String,
}

/// Claims returned by the provider's userinfo endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub picture: String,
}

/// Reasons the admission gate rejects a set of claims.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum AdmissionError {
    #[error("the identity provider returned no email address")]
    MissingEmail,
    #[error("the email address is not verified by the identity provider")]
    UnverifiedEmail,
    #[error("you must sign in with an @{allowed} account")]
    WrongDomain { allowed: String },
}

/// Case-insensitive check that `email` belongs to `allowed_domain`.
pub fn domain_matches(email: &str, allowed_domain: &str) -> bool {
    let suffix = format!("@{}", allowed_domain.to_lowercase());
    email.to_lowercase().ends_with(&suffix)
}

/// Gate provider claims into a trusted identity.
///
/// Requires an email address, a verified-email assertion, and membership in
/// the allowed domain. No partial identity is ever produced.
///
/// # Errors
/// Returns the first failed admission check.
pub fn admit_claims(
    claims: ProviderClaims,
    allowed_domain: &str,
) -> Result<UserIdentity, AdmissionError> {
    let email = claims
        .email
        .filter(|value| !value.trim().is_empty())
        .ok_or(AdmissionError::MissingEmail)?;
    if !claims.email_verified {
        return Err(AdmissionError::UnverifiedEmail);
    }
    if !domain_matches(&email, allowed_domain) {
        return Err(AdmissionError::WrongDomain {
            allowed: allowed_domain.to_owned(),
        });
    }
    Ok(UserIdentity {
        id: claims.sub,
        email,
        name: claims.name,
        given_name: claims.given_name,
        picture: claims.picture,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn claims(email: &str, verified: bool) -> ProviderClaims {
        ProviderClaims {
            sub: "subject-1".into(),
            email: Some(email.into()),
            email_verified: verified,
            name: "Alex Example".into(),
            given_name: "Alex".into(),
            picture: String::new(),
        }
    }

    #[rstest]
    #[case("user@lynxx.com", true)]
    #[case("user@LYNXX.COM", true)]
    #[case("user@other.com", false)]
    #[case("user@notlynxx.org", false)]
    fn domain_match_is_case_insensitive(#[case] email: &str, #[case] expected: bool) {
        assert_eq!(domain_matches(email, "lynxx.com"), expected);
    }

    #[rstest]
    fn admits_verified_member_of_domain() {
        let identity = admit_claims(claims("user@LYNXX.com", true), "lynxx.com").expect("admitted");
        assert_eq!(identity.id, "subject-1");
        assert_eq!(identity.email, "user@LYNXX.com");
    }

    #[rstest]
    fn rejects_unverified_email() {
        let err = admit_claims(claims("user@lynxx.com", false), "lynxx.com").expect_err("rejected");
        assert_eq!(err, AdmissionError::UnverifiedEmail);
    }

    #[rstest]
    fn rejects_foreign_domain() {
        let err = admit_claims(claims("user@other.com", true), "lynxx.com").expect_err("rejected");
        assert!(matches!(err, AdmissionError::WrongDomain { .. }));
    }

    #[rstest]
    fn rejects_missing_email() {
        let mut missing = claims("", true);
        missing.email = None;
        let err = admit_claims(missing, "lynxx.com").expect_err("rejected");
        assert_eq!(err, AdmissionError::MissingEmail);
    }
}
