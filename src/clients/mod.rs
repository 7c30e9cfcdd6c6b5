/// OAuth client-credentials token acquisition
pub mod auth;
/// Data entities for releases, tokens and geo results
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// Geo-IP lookup client
pub mod geo;
/// Shared HTTP plumbing: retries, timeouts, response decoding
pub mod http;
/// Spotify catalog API client
pub mod spotify;

pub use auth::{CachedToken, ClientCredentials, SpotifyAuth, TokenSource};
pub use geo::{GeoClient, GeoLocator};
pub use spotify::{CatalogApi, CatalogQuery, ReleaseCatalog, SpotifyCatalog};
