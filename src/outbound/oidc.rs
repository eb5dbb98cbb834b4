//! Reqwest/oauth2-backed OIDC identity provider adapter.
//!
//! This adapter owns transport details only: discovery fetch, the
//! authorization-code exchange (HTTP Basic client authentication), and the
//! userinfo fetch. Every outbound call runs on a client with a bounded
//! timeout so an unreachable provider cannot hang a request; there is no
//! automatic retry. Admission of the resulting claims is domain logic and
//! lives elsewhere.

use std::time::Duration;

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, RequestTokenError,
    Scope, TokenResponse, TokenUrl,
};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::domain::identity::ProviderClaims;
use crate::domain::ports::{AuthorizationRedirect, IdentityProvider, ProviderError};

const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);
const SCOPES: [&str; 3] = ["openid", "email", "profile"];

/// OAuth client credentials issued by the provider.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Identity provider adapter speaking the OIDC authorization-code flow.
///
/// Constructed once at startup; credentials may be absent (unconfigured
/// deployments refuse OAuth operations cleanly instead of panicking).
pub struct OidcProvider {
    http: Client,
    discovery_url: Url,
    redirect_url: Url,
    credentials: Option<ClientCredentials>,
}

/// The subset of the discovery document this service needs.
#[derive(Debug, Deserialize)]
struct DiscoveryDoc {
    authorization_endpoint: Url,
    token_endpoint: Url,
    userinfo_endpoint: Url,
}

struct TokenEndpoints {
    authorization: Url,
    token: Url,
}

impl OidcProvider {
    /// Build the adapter with an explicit request timeout.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        discovery_url: Url,
        redirect_url: Url,
        credentials: Option<ClientCredentials>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(OUTBOUND_TIMEOUT).build()?;
        Ok(Self {
            http,
            discovery_url,
            redirect_url,
            credentials,
        })
    }

    fn credentials(&self) -> Result<&ClientCredentials, ProviderError> {
        self.credentials.as_ref().ok_or(ProviderError::Unconfigured)
    }

    async fn discover(&self) -> Result<DiscoveryDoc, ProviderError> {
        let response = self
            .http
            .get(self.discovery_url.clone())
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }
        response
            .json::<DiscoveryDoc>()
            .await
            .map_err(|error| ProviderError::Malformed(error.to_string()))
    }

    fn oauth_client(&self, endpoints: TokenEndpoints) -> Result<BasicClient, ProviderError> {
        let credentials = self.credentials()?;
        Ok(BasicClient::new(
            ClientId::new(credentials.client_id.clone()),
            Some(ClientSecret::new(credentials.client_secret.clone())),
            AuthUrl::from_url(endpoints.authorization),
            Some(TokenUrl::from_url(endpoints.token)),
        )
        .set_redirect_uri(RedirectUrl::from_url(self.redirect_url.clone())))
    }

    /// Execute an oauth2-crate HTTP request on our bounded-timeout client.
    async fn execute(&self, request: oauth2::HttpRequest) -> Result<oauth2::HttpResponse, ProviderError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|error| ProviderError::Malformed(error.to_string()))?;
        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name.as_str(), value.as_bytes());
        }
        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(transport)?;

        let status_code = oauth2::http::StatusCode::from_u16(response.status().as_u16())
            .map_err(|error| ProviderError::Malformed(error.to_string()))?;
        let mut headers = oauth2::http::HeaderMap::new();
        for (name, value) in response.headers() {
            let converted = oauth2::http::header::HeaderName::from_bytes(name.as_str().as_bytes())
                .ok()
                .zip(oauth2::http::header::HeaderValue::from_bytes(value.as_bytes()).ok());
            if let Some((name, value)) = converted {
                headers.append(name, value);
            }
        }
        let body = response.bytes().await.map_err(transport)?.to_vec();
        Ok(oauth2::HttpResponse {
            status_code,
            headers,
            body,
        })
    }

    async fn fetch_userinfo(
        &self,
        endpoint: Url,
        access_token: &str,
    ) -> Result<ProviderClaims, ProviderError> {
        let response = self
            .http
            .get(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }
        response
            .json::<ProviderClaims>()
            .await
            .map_err(|error| ProviderError::Malformed(error.to_string()))
    }
}

fn transport(error: reqwest::Error) -> ProviderError {
    ProviderError::Transport(error.to_string())
}

#[async_trait]
impl IdentityProvider for OidcProvider {
    async fn begin(&self) -> Result<AuthorizationRedirect, ProviderError> {
        self.credentials()?;
        let discovery = self.discover().await?;
        let client = self.oauth_client(TokenEndpoints {
            authorization: discovery.authorization_endpoint,
            token: discovery.token_endpoint,
        })?;

        let mut request = client.authorize_url(CsrfToken::new_random);
        for scope in SCOPES {
            request = request.add_scope(Scope::new(scope.to_owned()));
        }
        let (url, csrf) = request.url();
        Ok(AuthorizationRedirect {
            url,
            state: csrf.secret().clone(),
        })
    }

    async fn complete(&self, code: &str) -> Result<ProviderClaims, ProviderError> {
        self.credentials()?;
        let discovery = self.discover().await?;
        let userinfo_endpoint = discovery.userinfo_endpoint.clone();
        let client = self.oauth_client(TokenEndpoints {
            authorization: discovery.authorization_endpoint,
            token: discovery.token_endpoint,
        })?;

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_owned()))
            .request_async(|request| self.execute(request))
            .await
            .map_err(|error| match error {
                RequestTokenError::Request(inner) => inner,
                RequestTokenError::ServerResponse(response) => {
                    ProviderError::Rejected(response.to_string())
                }
                other => ProviderError::Malformed(other.to_string()),
            })?;

        self.fetch_userinfo(userinfo_endpoint, token.access_token().secret())
            .await
    }
}
