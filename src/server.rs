//! HTTP front end: the rendered "around you" view, the shared player state and
//! the catalog queries.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use crate::app::App;
use crate::clients::errors::{Error, Failure, Result, UpstreamKind};
use crate::config::Config;
use crate::flow::Trigger;
use crate::render::{PlayerState, View};

pub struct AppState {
    pub app: App,
    pub player: RwLock<PlayerState>,
}

impl AppState {
    pub fn new(app: App) -> Self {
        AppState {
            app,
            player: RwLock::new(PlayerState::default()),
        }
    }
}

/// Maps client errors onto HTTP responses.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::ConfigurationError(_) | Error::MissingCredentials(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            err => match err.failure() {
                Failure::Upstream(UpstreamKind::TimedOut) => StatusCode::GATEWAY_TIMEOUT,
                Failure::Auth | Failure::Upstream(_) => StatusCode::BAD_GATEWAY,
            },
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult = std::result::Result<Json<serde_json::Value>, ApiError>;

#[derive(Deserialize)]
struct RefreshParams {
    country: Option<String>,
}

#[derive(Deserialize)]
struct SearchParams {
    term: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/around-you", get(around_you))
        .route("/around-you/refresh", post(refresh))
        .route("/player", get(player).put(set_player))
        .route("/api/charts", get(top_charts))
        .route("/api/genres/{genre}", get(songs_by_genre))
        .route("/api/search", get(songs_by_search))
        .route("/api/artists/{id}", get(artist_details))
        .route("/api/tracks/{id}", get(song_details))
        .route("/api/tracks/{id}/related", get(song_related))
        .with_state(state)
}

async fn render_current(state: &AppState) -> Response {
    let snapshot = state.app.controller.snapshot();
    let player = state.player.read().await;
    Json(View::from_snapshot(&snapshot, &player)).into_response()
}

async fn around_you(State(state): State<Arc<AppState>>) -> Response {
    render_current(&state).await
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RefreshParams>,
) -> Response {
    let trigger = Trigger::from_country(params.country.as_deref());
    state.app.controller.invoke(trigger).await;
    render_current(&state).await
}

async fn player(State(state): State<Arc<AppState>>) -> Json<PlayerState> {
    Json(state.player.read().await.clone())
}

async fn set_player(
    State(state): State<Arc<AppState>>,
    Json(update): Json<PlayerState>,
) -> Json<PlayerState> {
    *state.player.write().await = update.clone();
    Json(update)
}

async fn top_charts(State(state): State<Arc<AppState>>) -> ApiResult {
    Ok(Json(state.app.catalog.top_charts().await?))
}

async fn songs_by_genre(
    State(state): State<Arc<AppState>>,
    Path(genre): Path<String>,
) -> ApiResult {
    Ok(Json(state.app.catalog.songs_by_genre(&genre).await?))
}

async fn songs_by_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    Ok(Json(state.app.catalog.songs_by_search(&params.term).await?))
}

async fn artist_details(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(state.app.catalog.artist_details(&id).await?))
}

async fn song_details(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(state.app.catalog.song_details(&id).await?))
}

async fn song_related(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(state.app.catalog.song_related(&id).await?))
}

/// Build the clients, kick off the first invocation and serve until shutdown.
pub async fn serve(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(App::from_config(&config)?));

    let controller = Arc::clone(&state.app.controller);
    tokio::spawn(async move {
        controller.invoke(Trigger::Mount).await;
    });

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
