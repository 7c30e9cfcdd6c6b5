//! Aroundyou - new music releases around you
//!
//! Resolves the caller's country through a geo-IP lookup, fetches a Spotify
//! client-credentials token and lists the catalog's new releases for that
//! country as render-ready cards.

/// Wiring of the live clients
pub mod app;
/// Client modules for the geo lookup, OAuth token and catalog services
pub mod clients;
/// Environment driven configuration
pub mod config;
/// The sequential geo → token → catalog orchestration
pub mod flow;
/// Loading / error / card views
pub mod render;
/// HTTP front end
pub mod server;
