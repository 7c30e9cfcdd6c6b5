use std::future::Future;

use log::{debug, warn};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::clients::{
    auth::TokenSource,
    entities::{AccessToken, Album},
    errors::{Error, Result},
    http::{CallPolicy, parse_json},
};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1/";

#[derive(Deserialize, Debug)]
struct AlbumPage {
    #[serde(default)]
    items: Vec<Album>,
}

#[derive(Deserialize, Debug)]
struct NewReleasesResponse {
    albums: AlbumPage,
}

/// Source of the "new releases" album list.
pub trait ReleaseCatalog: Send + Sync {
    /// `country` is an optional market filter; `None` leaves it out of the request.
    fn new_releases(
        &self,
        token: &AccessToken,
        country: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Album>>> + Send;
}

/// The read-only catalog queries exposed next to the "around you" flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    TopCharts,
    SongsByGenre(String),
    SongsBySearch(String),
    ArtistDetails(String),
    SongDetails(String),
    SongRelated(String),
}

impl CatalogQuery {
    /// Path relative to the API base URL.
    pub fn path(&self) -> Result<String> {
        Ok(match self {
            CatalogQuery::TopCharts => "browse/new-releases".to_string(),
            CatalogQuery::SongsByGenre(_) => "recommendations".to_string(),
            CatalogQuery::SongsBySearch(_) => "search".to_string(),
            CatalogQuery::ArtistDetails(id) => format!("artists/{}", checked_id(id)?),
            CatalogQuery::SongDetails(id) => format!("tracks/{}", checked_id(id)?),
            CatalogQuery::SongRelated(id) => format!("tracks/{}/related", checked_id(id)?),
        })
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            CatalogQuery::SongsByGenre(genre) => vec![("seed_genres", genre.clone())],
            CatalogQuery::SongsBySearch(term) => {
                vec![("q", term.clone()), ("type", "track".to_string())]
            }
            _ => Vec::new(),
        }
    }
}

// Spotify ids are base62; anything else would escape the path segment
fn checked_id(id: &str) -> Result<&str> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(id)
    } else {
        Err(Error::InvalidArgument(format!("{id:?} is not a catalog id")))
    }
}

/// Thin client over the Spotify Web API catalog endpoints.
pub struct SpotifyCatalog {
    http: reqwest::Client,
    base_url: String,
    policy: CallPolicy,
}

impl SpotifyCatalog {
    pub fn new(http: reqwest::Client, base_url: &str, policy: CallPolicy) -> Self {
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        SpotifyCatalog {
            http,
            base_url,
            policy,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let http = &self.http;
        let url = url.as_str();
        let bearer = token.value.as_str();
        let timeout = self.policy.timeout;

        debug!("GET {url} {params:?}");
        self.policy
            .retry
            .run(path, move || async move {
                let response = http
                    .get(url)
                    .bearer_auth(bearer)
                    .query(params)
                    .timeout(timeout)
                    .send()
                    .await?;
                parse_json(response).await
            })
            .await
    }

    pub async fn query(
        &self,
        token: &AccessToken,
        query: &CatalogQuery,
    ) -> Result<serde_json::Value> {
        let path = query.path()?;
        self.get(token, &path, &query.params()).await
    }
}

impl ReleaseCatalog for SpotifyCatalog {
    async fn new_releases(&self, token: &AccessToken, country: Option<&str>) -> Result<Vec<Album>> {
        let params: Vec<(&str, String)> = country
            .filter(|code| !code.is_empty())
            .map(|code| ("country", code.to_string()))
            .into_iter()
            .collect();
        let response: NewReleasesResponse = self
            .get(token, "browse/new-releases", &params)
            .await?;
        Ok(response.albums.items)
    }
}

/// The six catalog queries, authorized through a shared token provider.
pub struct CatalogApi<T> {
    catalog: SpotifyCatalog,
    tokens: T,
}

impl<T: TokenSource> CatalogApi<T> {
    pub fn new(catalog: SpotifyCatalog, tokens: T) -> Self {
        CatalogApi { catalog, tokens }
    }

    pub async fn fetch(&self, query: &CatalogQuery) -> Result<serde_json::Value> {
        // reject bad ids before spending a token request on them
        query.path()?;
        let token = self.tokens.access_token().await?;
        match self.catalog.query(&token, query).await {
            Err(Error::Status { status, .. }) if status == StatusCode::UNAUTHORIZED => {
                warn!("Catalog rejected the access token, fetching a new one");
                self.tokens.invalidate().await;
                let token = self.tokens.access_token().await?;
                self.catalog.query(&token, query).await
            }
            result => result,
        }
    }

    pub async fn top_charts(&self) -> Result<serde_json::Value> {
        self.fetch(&CatalogQuery::TopCharts).await
    }

    pub async fn songs_by_genre(&self, genre: &str) -> Result<serde_json::Value> {
        self.fetch(&CatalogQuery::SongsByGenre(genre.to_string()))
            .await
    }

    pub async fn songs_by_search(&self, term: &str) -> Result<serde_json::Value> {
        self.fetch(&CatalogQuery::SongsBySearch(term.to_string()))
            .await
    }

    pub async fn artist_details(&self, artist_id: &str) -> Result<serde_json::Value> {
        self.fetch(&CatalogQuery::ArtistDetails(artist_id.to_string()))
            .await
    }

    pub async fn song_details(&self, track_id: &str) -> Result<serde_json::Value> {
        self.fetch(&CatalogQuery::SongDetails(track_id.to_string()))
            .await
    }

    pub async fn song_related(&self, track_id: &str) -> Result<serde_json::Value> {
        self.fetch(&CatalogQuery::SongRelated(track_id.to_string()))
            .await
    }
}
