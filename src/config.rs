use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, warn};

use crate::clients::{
    ClientCredentials,
    auth::DEFAULT_TOKEN_URL,
    errors::{Error, Result},
    geo::DEFAULT_GEO_URL,
    http::{CallPolicy, RetryPolicy},
    spotify::DEFAULT_API_URL,
};

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
const GEO_TIMEOUT: Duration = Duration::from_secs(5);
const SPOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Load `.env` from the working directory, then `<config dir>/aroundyou/.env`.
/// Variables already present in the process environment win.
pub fn load_env_files() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {path:?}"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {e}"),
    }
    if let Some(path) = user_env_file() {
        match dotenvy::from_path(&path) {
            Ok(()) => debug!("Loaded environment from {path:?}"),
            Err(e) if e.not_found() => {}
            Err(e) => warn!("Ignoring unreadable {path:?}: {e}"),
        }
    }
}

fn user_env_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("aroundyou").join(".env"))
}

/// Everything the clients need to talk to the outside world.
#[derive(Clone)]
pub struct Config {
    pub geo_url: String,
    pub geo_api_key: Option<String>,
    pub token_url: String,
    pub api_url: String,
    pub credentials: Option<ClientCredentials>,
    pub geo_policy: CallPolicy,
    pub token_policy: CallPolicy,
    pub catalog_policy: CallPolicy,
    pub bind: SocketAddr,
}

#[derive(Default)]
pub struct ConfigBuilder {
    geo_url: Option<String>,
    geo_api_key: Option<String>,
    token_url: Option<String>,
    api_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    timeout: Option<Duration>,
    retry_attempts: Option<u32>,
    bind: Option<SocketAddr>,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    env_var(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| Error::ConfigurationError(format!("{name}={raw:?}: {e}")))
        })
        .transpose()
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from the process environment.
    pub fn from_env() -> Result<Self> {
        Ok(ConfigBuilder {
            geo_url: env_var("GEO_API_URL"),
            geo_api_key: env_var("GEO_API_KEY"),
            token_url: env_var("SPOTIFY_TOKEN_URL"),
            api_url: env_var("SPOTIFY_API_URL"),
            client_id: env_var("SPOTIFY_CLIENT_ID"),
            client_secret: env_var("SPOTIFY_CLIENT_SECRET"),
            timeout: parse_env::<u64>("AROUNDYOU_TIMEOUT_MS")?.map(Duration::from_millis),
            retry_attempts: parse_env("AROUNDYOU_RETRY_ATTEMPTS")?,
            bind: parse_env("AROUNDYOU_BIND")?,
        })
    }

    pub fn geo_url(mut self, url: impl Into<String>) -> Self {
        self.geo_url = Some(url.into());
        self
    }

    pub fn geo_api_key(mut self, key: impl Into<String>) -> Self {
        self.geo_api_key = Some(key.into());
        self
    }

    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn client_credentials(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self.client_secret = Some(secret.into());
        self
    }

    /// Same timeout for every remote call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = Some(attempts);
        self
    }

    pub fn bind(mut self, bind: SocketAddr) -> Self {
        self.bind = Some(bind);
        self
    }

    pub fn build(self) -> Result<Config> {
        let credentials = match (self.client_id, self.client_secret) {
            (Some(id), Some(secret)) => Some(ClientCredentials::new(id, secret)),
            (None, None) => None,
            _ => {
                warn!("Only one of SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET is set, ignoring both");
                None
            }
        };
        let retry = RetryPolicy {
            max_attempts: self
                .retry_attempts
                .unwrap_or(RetryPolicy::default().max_attempts),
            ..RetryPolicy::default()
        };
        let policy = |fallback: Duration| CallPolicy {
            timeout: self.timeout.unwrap_or(fallback),
            retry,
        };
        let bind = match self.bind {
            Some(bind) => bind,
            None => DEFAULT_BIND
                .parse()
                .map_err(|e| Error::ConfigurationError(format!("{DEFAULT_BIND}: {e}")))?,
        };

        Ok(Config {
            geo_policy: policy(GEO_TIMEOUT),
            token_policy: policy(SPOTIFY_TIMEOUT),
            catalog_policy: policy(SPOTIFY_TIMEOUT),
            geo_url: self.geo_url.unwrap_or_else(|| DEFAULT_GEO_URL.to_string()),
            geo_api_key: self.geo_api_key,
            token_url: self
                .token_url
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            api_url: self.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            credentials,
            bind,
        })
    }
}
