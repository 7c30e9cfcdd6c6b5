//! Fake geo / accounts / catalog services on an ephemeral local port.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aroundyou::config::ConfigBuilder;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

#[derive(Clone)]
pub enum Reply {
    Json(StatusCode, Value),
    /// Never answers within any sane client timeout.
    Hang,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Reply::Json(StatusCode::OK, body)
    }

    pub fn status(status: StatusCode) -> Self {
        Reply::Json(status, json!({ "error": status.as_u16() }))
    }

    async fn respond(self) -> Response {
        match self {
            Reply::Json(status, body) => (status, Json(body)).into_response(),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                StatusCode::OK.into_response()
            }
        }
    }
}

/// Replies handed out in order; the last one repeats forever.
pub struct Script(Mutex<Vec<Reply>>);

impl Script {
    pub fn new(replies: Vec<Reply>) -> Self {
        assert!(!replies.is_empty());
        Script(Mutex::new(replies))
    }

    fn next(&self) -> Reply {
        let mut replies = self.0.lock().unwrap();
        if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies[0].clone()
        }
    }
}

impl From<Reply> for Script {
    fn from(reply: Reply) -> Self {
        Script::new(vec![reply])
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub path: String,
    pub authorization: Option<String>,
    pub query: HashMap<String, String>,
    pub body: String,
}

pub struct Upstream {
    pub geo: Script,
    pub token: Script,
    pub releases: Script,
    pub catalog: Script,
    geo_requests: Mutex<Vec<Request>>,
    token_requests: Mutex<Vec<Request>>,
    release_requests: Mutex<Vec<Request>>,
    catalog_requests: Mutex<Vec<Request>>,
}

pub fn album(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "artists": [{"name": "Artist Y"}],
        "images": [{"url": "http://img"}],
        "external_urls": {"spotify": "http://link"}
    })
}

pub fn releases(items: Vec<Value>) -> Value {
    json!({ "albums": { "items": items } })
}

impl Upstream {
    /// Scenario A of the happy path: US, one album, token `tok123`.
    pub fn happy() -> Self {
        Upstream::new(
            Reply::ok(json!({"location": {"country": "US"}})),
            Reply::ok(json!({"access_token": "tok123", "token_type": "Bearer", "expires_in": 3600})),
            Reply::ok(releases(vec![album("a1", "Song X")])),
        )
    }

    pub fn new(geo: impl Into<Script>, token: impl Into<Script>, releases: impl Into<Script>) -> Self {
        Upstream {
            geo: geo.into(),
            token: token.into(),
            releases: releases.into(),
            catalog: Reply::ok(json!({"catalog": true})).into(),
            geo_requests: Mutex::default(),
            token_requests: Mutex::default(),
            release_requests: Mutex::default(),
            catalog_requests: Mutex::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: impl Into<Script>) -> Self {
        self.catalog = catalog.into();
        self
    }

    pub fn geo_requests(&self) -> Vec<Request> {
        self.geo_requests.lock().unwrap().clone()
    }

    pub fn token_requests(&self) -> Vec<Request> {
        self.token_requests.lock().unwrap().clone()
    }

    pub fn release_requests(&self) -> Vec<Request> {
        self.release_requests.lock().unwrap().clone()
    }

    pub fn catalog_requests(&self) -> Vec<Request> {
        self.catalog_requests.lock().unwrap().clone()
    }
}

fn request(uri: &Uri, headers: &HeaderMap, query: HashMap<String, String>, body: String) -> Request {
    Request {
        path: uri.path().to_string(),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        query,
        body,
    }
}

async fn geo(
    State(up): State<Arc<Upstream>>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    up.geo_requests
        .lock()
        .unwrap()
        .push(request(&uri, &headers, query, String::new()));
    up.geo.next().respond().await
}

async fn token(State(up): State<Arc<Upstream>>, uri: Uri, headers: HeaderMap, body: String) -> Response {
    up.token_requests
        .lock()
        .unwrap()
        .push(request(&uri, &headers, HashMap::new(), body));
    up.token.next().respond().await
}

async fn new_releases(
    State(up): State<Arc<Upstream>>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    up.release_requests
        .lock()
        .unwrap()
        .push(request(&uri, &headers, query, String::new()));
    up.releases.next().respond().await
}

async fn catalog(
    State(up): State<Arc<Upstream>>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    up.catalog_requests
        .lock()
        .unwrap()
        .push(request(&uri, &headers, query, String::new()));
    up.catalog.next().respond().await
}

pub async fn start(upstream: Upstream) -> (SocketAddr, Arc<Upstream>) {
    let upstream = Arc::new(upstream);
    let app = Router::new()
        .route("/geo", get(geo))
        .route("/token", post(token))
        .route("/v1/browse/new-releases", get(new_releases))
        .fallback(catalog)
        .with_state(Arc::clone(&upstream));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, upstream)
}

/// Config pointing every client at the fake services, without retries.
pub fn config_for(addr: SocketAddr) -> ConfigBuilder {
    ConfigBuilder::new()
        .geo_url(format!("http://{addr}/geo"))
        .geo_api_key("geo-key")
        .token_url(format!("http://{addr}/token"))
        .api_url(format!("http://{addr}/v1/"))
        .client_credentials("client-id", "client-secret")
        .timeout(Duration::from_millis(500))
        .retry_attempts(1)
}
