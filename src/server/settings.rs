//! Portal configuration loaded via OrthoConfig.
//!
//! Environment variables carry the `PORTAL_` prefix; CLI flags and config
//! files layer on top per OrthoConfig's usual precedence. Validation is
//! build-mode aware: debug builds warn and fall back, release builds
//! refuse to start without OAuth credentials or a public URL.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use super::session::BuildMode;
use crate::outbound::oidc::ClientCredentials;

const DEFAULT_DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";
const DEFAULT_ALLOWED_DOMAIN: &str = "lynxx.com";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";

/// Configuration values for the launcher service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PORTAL")]
pub struct PortalSettings {
    /// OAuth client id issued by the identity provider.
    pub client_id: Option<String>,
    /// OAuth client secret issued by the identity provider.
    pub client_secret: Option<String>,
    /// OIDC discovery document URL.
    pub discovery_url: Option<String>,
    /// Email domain admitted at sign-in.
    pub allowed_domain: Option<String>,
    /// Comma-separated emails granted admin access to catalogue mutations.
    pub admin_emails: Option<String>,
    /// Path of the catalogue document.
    pub apps_file: Option<PathBuf>,
    /// Directory holding per-user preference documents.
    pub preferences_dir: Option<PathBuf>,
    /// Socket address to bind.
    pub bind_addr: Option<String>,
    /// Externally reachable base URL, used to build the OAuth redirect URI.
    pub public_url: Option<String>,
}

/// Errors raised while validating portal configuration.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("OAuth client credentials are required outside debug builds")]
    MissingOAuthCredentials,
    #[error("PORTAL_PUBLIC_URL is required outside debug builds")]
    MissingPublicUrl,
    #[error("invalid value for {name}='{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl PortalSettings {
    /// Return the discovery URL, falling back to Google's.
    ///
    /// # Errors
    /// Returns an error when the configured value does not parse as a URL.
    pub fn discovery_url(&self) -> Result<Url, SettingsError> {
        let raw = self.discovery_url.as_deref().unwrap_or(DEFAULT_DISCOVERY_URL);
        Url::parse(raw).map_err(|error| SettingsError::Invalid {
            name: "PORTAL_DISCOVERY_URL",
            value: raw.to_owned(),
            reason: error.to_string(),
        })
    }

    /// Return the OAuth callback URL under the public base URL.
    ///
    /// # Errors
    /// Returns an error when the public URL does not parse.
    pub fn redirect_url(&self) -> Result<Url, SettingsError> {
        let base = self.public_url.as_deref().unwrap_or(DEFAULT_PUBLIC_URL);
        let joined = format!("{}/auth/callback", base.trim_end_matches('/'));
        Url::parse(&joined).map_err(|error| SettingsError::Invalid {
            name: "PORTAL_PUBLIC_URL",
            value: base.to_owned(),
            reason: error.to_string(),
        })
    }

    /// Return the allowed sign-in domain, falling back to the default.
    pub fn allowed_domain(&self) -> &str {
        self.allowed_domain
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_ALLOWED_DOMAIN)
    }

    /// Return the configured admin emails, split on commas.
    pub fn admin_emails(&self) -> Vec<String> {
        self.admin_emails
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Return the catalogue file path, falling back to `apps.json`.
    pub fn apps_file(&self) -> PathBuf {
        self.apps_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("apps.json"))
    }

    /// Return the preferences directory, falling back to `user_preferences`.
    pub fn preferences_dir(&self) -> PathBuf {
        self.preferences_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("user_preferences"))
    }

    /// Return the bind address.
    ///
    /// # Errors
    /// Returns an error when the configured value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|error: std::net::AddrParseError| {
            SettingsError::Invalid {
                name: "PORTAL_BIND_ADDR",
                value: raw.to_owned(),
                reason: error.to_string(),
            }
        })
    }

    /// Return the OAuth client credentials when both halves are present.
    pub fn credentials(&self) -> Option<ClientCredentials> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some(ClientCredentials {
                    client_id: id.to_owned(),
                    client_secret: secret.to_owned(),
                })
            }
            _ => None,
        }
    }

    /// Validate the configuration for the given build mode.
    ///
    /// Debug builds tolerate missing OAuth configuration (sign-in is
    /// refused per-request instead); release builds treat it as fatal.
    ///
    /// # Errors
    /// Returns the first fatal configuration problem.
    pub fn validate(&self, mode: BuildMode) -> Result<(), SettingsError> {
        self.discovery_url()?;
        self.bind_addr()?;
        self.redirect_url()?;

        if self.credentials().is_none() {
            if mode.is_debug() {
                warn!("OAuth client not fully configured; sign-in will not work");
            } else {
                return Err(SettingsError::MissingOAuthCredentials);
            }
        }
        if self.public_url.is_none() {
            if mode.is_debug() {
                warn!(default = DEFAULT_PUBLIC_URL, "PORTAL_PUBLIC_URL not set; using default");
            } else {
                return Err(SettingsError::MissingPublicUrl);
            }
        }
        if self.admin_emails().is_empty() {
            warn!("no admin emails configured; catalogue mutations will be refused");
        }
        Ok(())
    }
}
