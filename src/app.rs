use std::sync::Arc;

use log::{debug, warn};

use crate::clients::{
    CachedToken, CatalogApi, GeoClient, SpotifyAuth, SpotifyCatalog,
    entities::AccessToken,
    errors::Result,
    http::build_http_client,
};
use crate::config::Config;
use crate::flow::{AroundYou, FlowController};

pub type SharedTokens = Arc<CachedToken<SpotifyAuth>>;
pub type LiveController = FlowController<GeoClient, SharedTokens, SpotifyCatalog>;

/// The live clients, wired from one [`Config`].
pub struct App {
    pub controller: Arc<LiveController>,
    pub catalog: Arc<CatalogApi<SharedTokens>>,
    tokens: SharedTokens,
}

impl App {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = build_http_client()?;

        if config.geo_api_key.is_none() {
            warn!("GEO_API_KEY is not set, releases will not be filtered by country");
        }
        if config.credentials.is_none() {
            warn!("Spotify client credentials are not set, catalog calls will fail");
        }

        let tokens: SharedTokens = Arc::new(CachedToken::new(SpotifyAuth::new(
            http.clone(),
            config.token_url.clone(),
            config.credentials.clone(),
            config.token_policy,
        )));
        let geo = GeoClient::new(
            http.clone(),
            config.geo_url.clone(),
            config.geo_api_key.clone(),
            config.geo_policy,
        );
        let flow = AroundYou::new(
            geo,
            Arc::clone(&tokens),
            SpotifyCatalog::new(http.clone(), &config.api_url, config.catalog_policy),
        );
        let catalog = CatalogApi::new(
            SpotifyCatalog::new(http, &config.api_url, config.catalog_policy),
            Arc::clone(&tokens),
        );
        debug!("Clients configured against {}", config.api_url);

        Ok(App {
            controller: Arc::new(FlowController::new(flow)),
            catalog: Arc::new(catalog),
            tokens,
        })
    }

    /// Ask the accounts service for a brand new token, bypassing the cache.
    pub async fn fresh_token(&self) -> Result<AccessToken> {
        self.tokens.source().request_token().await
    }
}
