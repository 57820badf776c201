//! REST API — station list, detail, trend, and recent comments.
//!
//! All plain JSON over GET; the live feed never flows through here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use tokio::net::TcpListener;
use tracing::{error, info};

use dock_proto::station::{RestCommentList, StationDetail, StationList, TrendResponse};

use crate::store::{FeedStore, StationStore};

const RECENT_COMMENT_LIMIT: usize = 20;

#[derive(Clone)]
struct HttpState {
    stations: StationStore,
    feed: FeedStore,
}

pub fn start_server(
    bind_address: String,
    port: u16,
    stations: StationStore,
    feed: FeedStore,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app_state = HttpState { stations, feed };

        let app = Router::new()
            .route("/api/stations", get(list_stations))
            .route("/api/stations/:id", get(station_detail))
            .route("/api/stations/:id/trend", get(station_trend))
            .route("/api/stations/:id/comments", get(station_comments))
            .with_state(app_state);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}", addr, e);
                return;
            }
        };

        info!("HTTP API server listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

async fn list_stations(State(state): State<HttpState>) -> Json<StationList> {
    let stations = state.stations.summaries().await;
    Json(StationList { stations })
}

async fn station_detail(
    State(state): State<HttpState>,
    Path(id): Path<i64>,
) -> Result<Json<StationDetail>, StatusCode> {
    match state.stations.detail(id).await {
        Some(detail) => Ok(Json(detail)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn station_trend(
    State(state): State<HttpState>,
    Path(id): Path<i64>,
) -> Result<Json<TrendResponse>, StatusCode> {
    if !state.stations.station_exists(id).await {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(state.stations.trend(id, Utc::now()).await))
}

async fn station_comments(
    State(state): State<HttpState>,
    Path(id): Path<i64>,
) -> Result<Json<RestCommentList>, StatusCode> {
    if !state.stations.station_exists(id).await {
        return Err(StatusCode::NOT_FOUND);
    }
    let comments = state.feed.recent_comments(id, RECENT_COMMENT_LIMIT).await;
    Ok(Json(RestCommentList { comments }))
}
