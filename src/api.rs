//! HTTP endpoints: raffle upload, token-gated read, and the host/viewer pages.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::error::{RaffleError, RaffleResult};
use crate::state::AppState;
use crate::types::{RaffleId, RaffleView, UpsertRaffle};
use crate::ws;

/// Links handed back to the uploader
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResponse {
    pub raffle_id: RaffleId,
    pub host_url: String,
    pub viewer_url: String,
    pub winner_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Origin for generated links: configured base URL, else the request's own host
fn base_url(config: &ServerConfig, headers: &HeaderMap) -> String {
    if let Some(base) = &config.public_base_url {
        return base.trim_end_matches('/').to_string();
    }

    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}", proto, host)
}

/// Create or update a raffle.
///
/// POST /api/raffles
pub async fn upsert_raffle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<UpsertRaffle>, JsonRejection>,
) -> RaffleResult<Json<UpsertResponse>> {
    let Json(req) = body.map_err(|e| RaffleError::MalformedMessage(e.body_text()))?;
    let record = state.upsert_raffle(req).await;
    let base = base_url(&state.config, &headers);

    Ok(Json(UpsertResponse {
        host_url: format!("{}/host/{}/{}", base, record.id, record.host_token),
        viewer_url: format!("{}/view/{}/{}", base, record.id, record.viewer_token),
        raffle_id: record.id,
        winner_name: record.winner_name,
    }))
}

/// Current projection of a raffle; either token grants access.
///
/// GET /api/raffles/{raffle_id}?token=...
pub async fn get_raffle(
    State(state): State<Arc<AppState>>,
    Path(raffle_id): Path<RaffleId>,
    Query(query): Query<TokenQuery>,
) -> RaffleResult<Json<RaffleView>> {
    let view = state.get_raffle(&raffle_id, query.token.as_deref()).await?;
    Ok(Json(view))
}

async fn serve_page(state: &AppState, file: &str) -> Response {
    let path = state.config.static_dir.join(file);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Html(content).into_response(),
        Err(e) => {
            tracing::warn!(path = %path.display(), "Page not available: {}", e);
            (StatusCode::NOT_FOUND, "Page not found").into_response()
        }
    }
}

/// GET /host/{raffle_id}/{token}. The page authenticates itself over the websocket.
pub async fn serve_host_page(State(state): State<Arc<AppState>>) -> Response {
    serve_page(&state, "host.html").await
}

/// GET /view/{raffle_id}/{token}
pub async fn serve_view_page(State(state): State<Arc<AppState>>) -> Response {
    serve_page(&state, "view.html").await
}

/// Full application router
pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/api/raffles", post(upsert_raffle))
        .route("/api/raffles/{raffle_id}", get(get_raffle))
        .route("/ws", get(ws::ws_handler))
        .route("/host/{raffle_id}/{token}", get(serve_host_page))
        .route("/view/{raffle_id}/{token}", get(serve_view_page))
        .fallback_service(ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
