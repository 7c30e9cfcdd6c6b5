use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Shown when the catalog lists no artist for a release.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Shown when the catalog lists no cover image for a release.
pub const PLACEHOLDER_ARTWORK_URL: &str = "https://placehold.co/250x250?text=No+Artwork";
const ALBUM_LINK_PREFIX: &str = "https://open.spotify.com/album/";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoResult {
    /// Two letter country code, empty when unknown.
    pub country_code: String,
}

#[derive(Clone)]
pub struct AccessToken {
    pub value: String,
    pub token_type: String,
    pub expires_at: Instant,
}

impl AccessToken {
    pub fn new(value: String, token_type: String, lifetime: Duration) -> Self {
        AccessToken {
            value,
            token_type,
            expires_at: Instant::now() + lifetime,
        }
    }

    /// True when the token expires within `margin` from now.
    pub fn expires_within(&self, margin: Duration) -> bool {
        Instant::now() + margin >= self.expires_at
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

// never print the bearer secret
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.remaining())
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// One raw item of the `browse/new-releases` album list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// View-ready projection of one catalog album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackSummary {
    pub id: String,
    pub title: String,
    #[serde(rename = "artist")]
    pub artist_name: String,
    #[serde(rename = "artwork")]
    pub artwork_url: String,
    #[serde(rename = "previewUrl")]
    pub external_url: String,
}

impl From<Album> for TrackSummary {
    fn from(album: Album) -> TrackSummary {
        let artist_name = album
            .artists
            .into_iter()
            .next()
            .map_or_else(|| UNKNOWN_ARTIST.to_string(), |artist| artist.name);
        let artwork_url = album
            .images
            .into_iter()
            .next()
            .map_or_else(|| PLACEHOLDER_ARTWORK_URL.to_string(), |image| image.url);
        let external_url = album
            .external_urls
            .spotify
            .unwrap_or_else(|| format!("{ALBUM_LINK_PREFIX}{}", album.id));
        TrackSummary {
            id: album.id,
            title: album.name,
            artist_name,
            artwork_url,
            external_url,
        }
    }
}
