use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::clients::{
    entities::AccessToken,
    errors::{Error, Result},
    http::{CallPolicy, parse_json},
};

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
// Spotify client-credentials tokens live one hour
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize, Debug)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Client id/secret pair of a registered Spotify application.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        ClientCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

/// Anything able to hand out a bearer token for the catalog API.
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> impl Future<Output = Result<AccessToken>> + Send;

    /// Forget any token held for reuse, e.g. after the API rejected it.
    fn invalidate(&self) -> impl Future<Output = ()> + Send {
        std::future::ready(())
    }
}

impl<S: TokenSource> TokenSource for Arc<S> {
    fn access_token(&self) -> impl Future<Output = Result<AccessToken>> + Send {
        (**self).access_token()
    }

    fn invalidate(&self) -> impl Future<Output = ()> + Send {
        (**self).invalidate()
    }
}

/// OAuth client-credentials grant against the Spotify accounts service.
/// Every call fetches a brand new token.
pub struct SpotifyAuth {
    http: reqwest::Client,
    token_url: String,
    credentials: Option<ClientCredentials>,
    policy: CallPolicy,
}

impl SpotifyAuth {
    pub fn new(
        http: reqwest::Client,
        token_url: String,
        credentials: Option<ClientCredentials>,
        policy: CallPolicy,
    ) -> Self {
        SpotifyAuth {
            http,
            token_url,
            credentials,
            policy,
        }
    }

    pub async fn request_token(&self) -> Result<AccessToken> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            Error::MissingCredentials(
                "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must both be set".into(),
            )
        })?;
        let http = &self.http;
        let token_url = self.token_url.as_str();
        let timeout = self.policy.timeout;

        debug!("Requesting client-credentials token from {token_url}");
        let response: TokenResponse = self
            .policy
            .retry
            .run("token request", move || async move {
                let response = http
                    .post(token_url)
                    .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
                    .form(&[("grant_type", "client_credentials")])
                    .timeout(timeout)
                    .send()
                    .await?;
                parse_json(response).await
            })
            .await?;

        if response.access_token.is_empty() {
            return Err(Error::MissingToken);
        }
        let lifetime = response
            .expires_in
            .map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs);
        Ok(AccessToken::new(
            response.access_token,
            response.token_type,
            lifetime,
        ))
    }
}

impl TokenSource for SpotifyAuth {
    fn access_token(&self) -> impl Future<Output = Result<AccessToken>> + Send {
        self.request_token()
    }
}

/// Reuses a token until shortly before it expires, then asks `source` again.
pub struct CachedToken<S> {
    source: S,
    current: Mutex<Option<AccessToken>>,
    margin: Duration,
}

impl<S: TokenSource> CachedToken<S> {
    pub fn new(source: S) -> Self {
        Self::with_margin(source, REFRESH_MARGIN)
    }

    pub fn with_margin(source: S, margin: Duration) -> Self {
        CachedToken {
            source,
            current: Mutex::new(None),
            margin,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: TokenSource> TokenSource for CachedToken<S> {
    async fn access_token(&self) -> Result<AccessToken> {
        // held across the refresh so concurrent callers share one request
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref() {
            if !token.expires_within(self.margin) {
                return Ok(token.clone());
            }
            info!("Access token expires soon, refreshing");
        }
        let token = self.source.access_token().await?;
        *current = Some(token.clone());
        Ok(token)
    }

    async fn invalidate(&self) {
        self.current.lock().await.take();
    }
}
