use std::future::Future;

use log::debug;
use serde::Deserialize;

use crate::clients::{
    entities::GeoResult,
    errors::{Error, Result},
    http::{CallPolicy, parse_json},
};

pub const DEFAULT_GEO_URL: &str = "https://geo.ipify.org/api/v2/country";

#[derive(Deserialize, Debug, Default)]
struct Location {
    country: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GeoResponse {
    #[serde(default)]
    location: Option<Location>,
}

/// Resolves the caller's country.
pub trait GeoLocator: Send + Sync {
    fn locate(&self) -> impl Future<Output = Result<GeoResult>> + Send;
}

/// Geo-IP lookup against an ipify-compatible endpoint.
pub struct GeoClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    policy: CallPolicy,
}

impl GeoClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: String,
        api_key: Option<String>,
        policy: CallPolicy,
    ) -> Self {
        GeoClient {
            http,
            endpoint,
            api_key,
            policy,
        }
    }
}

impl GeoLocator for GeoClient {
    async fn locate(&self) -> Result<GeoResult> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::MissingCredentials("GEO_API_KEY is not set".into()))?;
        let http = &self.http;
        let endpoint = self.endpoint.as_str();
        let timeout = self.policy.timeout;

        let response: GeoResponse = self
            .policy
            .retry
            .run("geo lookup", move || async move {
                let response = http
                    .get(endpoint)
                    .query(&[("apiKey", api_key)])
                    .timeout(timeout)
                    .send()
                    .await?;
                parse_json(response).await
            })
            .await?;

        let country_code = response
            .location
            .and_then(|location| location.country)
            .unwrap_or_default();
        debug!("Geo lookup resolved country {country_code:?}");
        Ok(GeoResult { country_code })
    }
}
